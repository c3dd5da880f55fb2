use crate::error::DbrunError;

/// Print report lines to stdout, one per line.
pub fn print_report(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// Print error to stderr in the contract format: error: <category>: <message>
pub fn print_error(err: &DbrunError) {
    eprintln!("error: {}", err);
}

/// Split multi-line text into report lines.
pub fn text_lines(text: &str) -> Vec<String> {
    text.lines().map(String::from).collect()
}
