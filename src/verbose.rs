use std::time::Instant;

/// Diagnostic switches shared by the engine and the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbosity {
    pub enabled: bool,
    pub show_secrets: bool,
}

impl Verbosity {
    pub fn new(enabled: bool, show_secrets: bool) -> Self {
        Self {
            enabled,
            show_secrets,
        }
    }

    /// Silent diagnostics, used by library callers and tests.
    pub fn quiet() -> Self {
        Self::default()
    }

    /// Emit a diagnostic message to stderr when enabled.
    pub fn emit(&self, msg: &str) {
        if self.enabled {
            eprintln!("[dbrun] {}", msg);
        }
    }
}

/// Measures how long a job took, for diagnostics.
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }
}
