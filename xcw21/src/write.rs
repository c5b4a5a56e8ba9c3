//!
//! # Workspace Writing Module
//!

// Xcode21 Imports
use crate::utils::LineWriter;

// Local imports
use super::data::XmlElement;

/// The pre-rendered XML prologue.
const PROLOGUE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

/// Render the tree rooted at `root` in the IDE's workspace format:
/// three-space indent, one-line opening tags with spaced attributes, and
/// self-closed childless elements.
pub(crate) fn render(root: &XmlElement) -> String {
    let mut w = LineWriter::new("   ");
    w.append_raw(PROLOGUE);
    render_element(&mut w, root);
    w.finish()
}

fn render_element(w: &mut LineWriter, element: &XmlElement) {
    let mut open = format!("<{}", element.name);
    for (name, value) in &element.attributes {
        open.push_str(&format!(" {} = \"{}\"", name, escape_attribute(value)));
    }
    if element.children.is_empty() {
        open.push_str("/>");
        w.append(&open);
        return;
    }
    open.push('>');
    w.append(&open);
    w.increase_indent();
    for child in &element.children {
        render_element(w, child);
    }
    w.decrease_indent();
    w.append(&format!("</{}>", element.name));
}

/// Escape an attribute value: named entities for `& < > ' "`, hex entities
/// for non-ASCII.
fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c if !c.is_ascii() => out.push_str(&format!("&#x{:04X};", c as u32)),
            c => out.push(c),
        }
    }
    out
}
