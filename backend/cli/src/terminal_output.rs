//! Terminal output helpers: status notes and plain-text tables.

// ---------------------------------------------------------------------------
// ANSI styles
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && std::env::var("TERM")
            .map(|t| t != "dumb")
            .unwrap_or(false)
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

fn note(color: &str, symbol: &str, plain: &str, msg: &str) -> String {
    if supports_color() {
        format!("{color}{BOLD}{symbol}{RESET} {msg}")
    } else {
        format!("{plain}: {msg}")
    }
}

pub fn note_info(msg: &str) {
    eprintln!("{}", note(CYAN, "ℹ", "INFO", msg));
}

pub fn note_warn(msg: &str) {
    eprintln!("{}", note(YELLOW, "⚠", "WARN", msg));
}

pub fn note_error(msg: &str) {
    eprintln!("{}", note(RED, "✗", "ERROR", msg));
}

pub fn note_success(msg: &str) {
    eprintln!("{}", note(GREEN, "✓", "OK", msg));
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Render rows under left-aligned headers, padding to the widest cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(strip_ansi(cell).chars().count());
        }
    }

    let render_row = |cells: Vec<String>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(strip_ansi(cell).chars().count());
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = render_row(headers.iter().map(|h| h.to_string()).collect());
    out.push_str(&render_row(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        let cells = (0..widths.len())
            .map(|i| row.get(i).cloned().unwrap_or_default())
            .collect();
        out.push_str(&render_row(cells));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn renders_aligned_table() {
        let rows = vec![
            vec!["v1->v2".to_string(), "error".to_string(), "wildcard mismatch".to_string()],
            vec!["v2->v3".to_string(), "warning".to_string()],
        ];
        let table = render_table(&["Step", "Level", "Message"], &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("  Step    Level    Message"));
        assert!(lines[2].contains("wildcard mismatch"));
        assert_eq!(lines[3].trim_end(), "  v2->v3  warning");
    }
}
