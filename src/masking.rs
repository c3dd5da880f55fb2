use secrecy::{ExposeSecret, SecretString};

const REDACTED: &str = "[REDACTED]";

/// Render a secret for diagnostics: the value itself with `show_secrets`, a placeholder otherwise.
pub fn format_secret(secret: &SecretString, show_secrets: bool) -> String {
    if show_secrets {
        secret.expose_secret().to_string()
    } else {
        REDACTED.to_string()
    }
}

/// Mask the `PWD=` attribute of an ODBC connection string.
///
/// Braced values (`PWD={a;b}`) are masked up to the closing brace, where `}}`
/// inside the braces is an escaped `}`. Plain values end at the next `;`.
pub fn mask_connection_string(conn_str: &str, show_secrets: bool) -> String {
    if show_secrets {
        return conn_str.to_string();
    }

    let mut masked = String::with_capacity(conn_str.len());
    let mut rest = conn_str;
    while !rest.is_empty() {
        let end = attribute_end(rest);
        let attribute = &rest[..end];
        match attribute.split_once('=') {
            Some((key, _)) if key.trim().eq_ignore_ascii_case("pwd") => {
                masked.push_str(key);
                masked.push('=');
                masked.push_str(REDACTED);
            }
            _ => masked.push_str(attribute),
        }
        rest = &rest[end..];
        if let Some(tail) = rest.strip_prefix(';') {
            masked.push(';');
            rest = tail;
        }
    }
    masked
}

/// Byte offset of the `;` ending the first attribute of `s`, or `s.len()`.
fn attribute_end(s: &str) -> usize {
    let mut chars = s.char_indices().peekable();
    let mut seen_equals = false;
    let mut in_braces = false;

    while let Some((i, c)) = chars.next() {
        if in_braces {
            if c == '}' && chars.next_if(|&(_, next)| next == '}').is_none() {
                in_braces = false;
            }
            continue;
        }
        match c {
            ';' => return i,
            '=' if !seen_equals => {
                seen_equals = true;
                in_braces = chars.next_if(|&(_, next)| next == '{').is_some();
            }
            _ => {}
        }
    }
    s.len()
}
