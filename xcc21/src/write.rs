//!
//! # Configuration Writing Module
//!
//! Renders the line list back to text. The single normalization against the
//! parsed source is comment spacing: one space always follows `//`.
//!

// Local imports
use super::data::*;

/// Render `lines` to file content, one per line, newline-terminated.
pub(crate) fn render(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&render_line(line));
        out.push('\n');
    }
    out
}

/// Render one logical line.
pub(crate) fn render_line(line: &Line) -> String {
    match line {
        Line::Empty => String::new(),
        Line::Comment(text) if text.is_empty() => "//".to_string(),
        Line::Comment(text) => format!("// {}", text),
        Line::Include(include) => format!(
            "#include{} \"{}\"",
            if include.optional { "?" } else { "" },
            include.path
        ),
        Line::Setting(setting) => render_setting(setting),
    }
}

fn render_setting(setting: &Setting) -> String {
    let mut out = setting.key.clone();
    for (name, value) in setting.conditionals.iter() {
        out.push_str(&format!("[{}={}]", name, value));
    }
    out.push_str(" =");
    for value in &setting.values {
        out.push(' ');
        out.push_str(&render_value(value));
    }
    match &setting.comment {
        Some(comment) if comment.is_empty() => out.push_str(" //"),
        Some(comment) => out.push_str(&format!(" // {}", comment)),
        None => {}
    }
    out
}

/// Render one value: bare when nothing in it needs quoting, double-quoted
/// with the `\n \t \" \\` escapes otherwise. Empty values render as `""`.
fn render_value(value: &str) -> String {
    let plain = !value.is_empty()
        && !value.contains("//")
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if plain {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
