//!
//! # Pbx Writing Module
//!
//! Depth-first renderer over the value tree, reproducing the IDE's exact
//! formatting: tab indentation, section banners inside `objects`, single-line
//! build-file and file-reference records, and ` /* ... */` reference
//! annotations.
//!

// Xcode21 Imports
use crate::utils::{ErrorHelper, LineWriter, Ptr};

// Local imports
use super::data::*;
use super::read::is_value_char;

/// Render the value tree rooted at `root`, without the encoding header.
pub fn render(root: &Dict) -> PbxResult<String> {
    let mut writer = PbxWriter::new();
    writer.render_dict(root)?;
    Ok(writer.w.finish())
}

/// Render a full project file: the `// !$*UTF8*$!` encoding header, then the
/// root dictionary.
pub(crate) fn render_project(root: &Dict) -> PbxResult<String> {
    let mut writer = PbxWriter::new();
    writer.w.append_raw("// !$*UTF8*$!");
    writer.render_dict(root)?;
    Ok(writer.w.finish())
}

/// # Pbx Writing Helper
struct PbxWriter {
    w: LineWriter,
}

impl ErrorHelper for PbxWriter {
    type Error = PbxError;
    fn err(&self, msg: impl Into<String>) -> Self::Error {
        PbxError::Render(msg.into())
    }
}

impl PbxWriter {
    fn new() -> Self {
        Self {
            w: LineWriter::new("\t"),
        }
    }
    /// Render any [Value].
    fn render_value(&mut self, value: &Value) -> PbxResult<()> {
        match value {
            Value::Literal(lit) => self.render_literal(lit),
            Value::Dict(dict) => self.render_dict(dict),
            Value::Array(array) => self.render_array(array),
            Value::Sections(sections) => self.render_sections(sections),
            // Bare objects never appear in a linked tree; they live in sections
            Value::Object(_) => self.fail("unexpected object in value tree"),
        }
    }
    /// Render a dictionary: `{`, one `key = value;` entry per line, `}`.
    /// In single-line mode the entries run on, each `;` followed by a space.
    fn render_dict(&mut self, dict: &Dict) -> PbxResult<()> {
        self.w.append("{");
        self.w.increase_indent();
        for (key, value) in dict {
            self.render_entry(key, value)?;
        }
        self.w.decrease_indent();
        self.w.append("}");
        Ok(())
    }
    /// Render one `key = value;` dictionary entry.
    fn render_entry(&mut self, key: &Literal, value: &Value) -> PbxResult<()> {
        self.render_literal(key)?;
        self.w.same_line();
        self.w.append(" = ");
        self.w.same_line();
        self.render_value(value)?;
        self.terminate(";");
        Ok(())
    }
    /// Render an array: `(`, one `value,` element per line, `)`.
    fn render_array(&mut self, array: &[Value]) -> PbxResult<()> {
        self.w.append("(");
        self.w.increase_indent();
        for value in array {
            self.render_value(value)?;
            self.terminate(",");
        }
        self.w.decrease_indent();
        self.w.append(")");
        Ok(())
    }
    /// Render the `objects` sections: each section wrapped in blank-line and
    /// banner trivia, entries within at the regular indent.
    fn render_sections(&mut self, sections: &Sections) -> PbxResult<()> {
        self.w.append("{");
        self.w.increase_indent();
        for (isa, section) in sections.iter() {
            self.w.append_raw("");
            self.w.append_raw(&format!("/* Begin {} section */", isa));
            for (key, object) in section {
                self.render_object_entry(key, object)?;
            }
            self.w.append_raw(&format!("/* End {} section */", isa));
        }
        self.w.decrease_indent();
        self.w.append("}");
        Ok(())
    }
    /// Render one `ID /* comment */ = { ... };` object entry.
    fn render_object_entry(&mut self, key: &Literal, object: &Ptr<PbxObject>) -> PbxResult<()> {
        self.render_literal(key)?;
        self.w.same_line();
        self.w.append(" = ");
        self.w.same_line();
        let obj = object.read()?;
        let single = obj.render_single_line();
        if single {
            self.w.push_single_line();
        }
        self.render_dict(&obj.content)?;
        if single {
            self.w.pop_single_line();
        }
        self.terminate(";");
        Ok(())
    }
    /// Render a literal: a string by the unquoting law, or a reference as its
    /// identifier, annotated with the target's comment unless silenced.
    fn render_literal(&mut self, lit: &Literal) -> PbxResult<()> {
        match lit {
            Literal::Str(s) => {
                let rendered = render_string(s);
                self.w.append(&rendered);
            }
            Literal::Ref { id, target, silent } => {
                self.w.append(id);
                if !silent {
                    if let Some(target) = target.upgrade() {
                        if let Some(comment) = target.read()?.comment() {
                            self.w.same_line();
                            self.w.append(&format!(" /* {} */", comment));
                        }
                    }
                }
            }
        }
        Ok(())
    }
    /// Append the entry/element terminator flush with the previous token,
    /// with a trailing space in single-line mode.
    fn terminate(&mut self, sep: &str) {
        self.w.same_line();
        if self.w.is_single_line() {
            self.w.append(&format!("{} ", sep));
        } else {
            self.w.append(sep);
        }
    }
}

/// Render string `s` by the unquoting law: bare if and only if non-empty and
/// every character is in `[A-Za-z0-9._/]`; otherwise double-quoted with the
/// `\n \t \" \\` escapes and `&#HHHH;` hex entities for non-ASCII.
fn render_string(s: &str) -> String {
    if !s.is_empty() && s.chars().all(is_value_char) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if !c.is_ascii() => out.push_str(&format!("&#{:04X};", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
