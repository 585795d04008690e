//! Conversion of errors into user-facing diagnostics.
//!
//! In embedded use errors simply propagate as `Err` values and the host
//! decides what to do (the *throws* mode of the language). The CLI uses the
//! *exits* mode: the error message is printed together with a one-line
//! excerpt of the script and a caret run under the offending token, and the
//! process exits with failure.

use crate::error::EidosError;
use crate::span::Span;
use colored::Colorize;

/// The line/character position an error resolved to, for hosts that track
/// positions themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptErrorPosition {
    /// 1-based line number.
    pub line: usize,
    /// 0-based character offset within the line.
    pub character: usize,
}

/// Resolve a span against the script text. Returns `None` when the span
/// does not lie within the script (for example, an error from an ephemeral
/// sub-script).
pub fn script_error_position(source: &str, span: Span) -> Option<ScriptErrorPosition> {
    if span.start > source.len() || span.end > source.len() || span.end < span.start {
        return None;
    }

    let mut line_start = span.start.min(source.len().saturating_sub(1));
    let bytes = source.as_bytes();
    while line_start > 0 && bytes[line_start - 1] != b'\n' && bytes[line_start - 1] != b'\r' {
        line_start -= 1;
    }

    let line = 1 + source[..span.start.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count();

    Some(ScriptErrorPosition {
        line,
        character: source[line_start..span.start].chars().count(),
    })
}

/// The two-line excerpt: the offending script line with tabs expanded to
/// three spaces, then a `^` run spanning the offending token.
pub fn format_script_error(source: &str, span: Span) -> Option<String> {
    let position = script_error_position(source, span)?;

    let mut line_start = span.start.min(source.len().saturating_sub(1));
    let bytes = source.as_bytes();
    while line_start > 0 && bytes[line_start - 1] != b'\n' && bytes[line_start - 1] != b'\r' {
        line_start -= 1;
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Error on script line {}, character {}:\n\n",
        position.line, position.character
    ));

    // The script line, tabs expanded, stopping at the newline.
    for c in source[line_start..].chars() {
        match c {
            '\t' => out.push_str("   "),
            '\n' | '\r' => break,
            _ => out.push(c),
        }
    }
    out.push('\n');

    // The indicator line: spaces (or expanded tabs) up to the error start,
    // then one caret per character of the offending token, minimum one.
    for c in source[line_start..span.start].chars() {
        match c {
            '\t' => out.push_str("   "),
            '\n' | '\r' => break,
            _ => out.push(' '),
        }
    }
    let caret_count = source
        .get(span.start..span.end)
        .map(|s| s.chars().count())
        .unwrap_or(0)
        .max(1);
    for _ in 0..caret_count {
        out.push('^');
    }
    out.push('\n');

    Some(out)
}

/// Exit-mode termination: print the diagnostic (with the excerpt when the
/// error carries a position inside `source`) and exit with failure.
pub fn report_and_exit(error: &EidosError, source: Option<&str>) -> ! {
    eprintln!("{}", error.to_string().bright_red());
    if let (Some(source), Some(span)) = (source, error.span()) {
        if let Some(excerpt) = format_script_error(source, span) {
            eprintln!();
            eprintln!("{}", excerpt);
        }
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_at(source: &str, fragment: &str) -> Span {
        let start = source.find(fragment).expect("fragment present");
        Span::new(start, start + fragment.len(), start, start + fragment.len(), 1, start + 1)
    }

    #[test]
    fn test_error_position() {
        let source = "x = 1;\ny = oops;\n";
        let span = span_at(source, "oops");
        let pos = script_error_position(source, span).unwrap();
        assert_eq!(pos.line, 2);
        assert_eq!(pos.character, 4);
    }

    #[test]
    fn test_caret_alignment() {
        let source = "x = 1 + ;";
        let span = span_at(source, ";");
        let excerpt = format_script_error(source, span).unwrap();
        let lines: Vec<&str> = excerpt.lines().collect();
        assert_eq!(lines[2], "x = 1 + ;");
        assert_eq!(lines[3], "        ^");
    }

    #[test]
    fn test_tab_expansion() {
        let source = "\tx = bad;";
        let span = span_at(source, "bad");
        let excerpt = format_script_error(source, span).unwrap();
        let lines: Vec<&str> = excerpt.lines().collect();
        assert_eq!(lines[2], "   x = bad;");
        assert_eq!(lines[3], "       ^^^");
    }
}
