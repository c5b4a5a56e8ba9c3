//!
//! # Indented Line-Writer
//!
//! Streaming builder for indented text output, shared by the plist and
//! workspace renderers. Holds the minimal state those renderers need to
//! express their formatting rules as local decisions:
//!
//! * an indent depth and per-renderer indent unit,
//! * a balanced "single-line" counter - while it is non-zero, appends extend
//!   the current line instead of opening new ones,
//! * a one-shot "same line as previous" flag for emitting tokens such as
//!   `" = "` or `";"` flush with the previous token.
//!

/// # Line Writer
///
/// Buffered, indented text emitter.
/// Completed lines are accumulated in `lines`; the line under construction in `current`.
#[derive(Debug, Default)]
pub struct LineWriter {
    /// Completed lines
    lines: Vec<String>,
    /// Current partial line
    current: String,
    /// Indent depth
    indent: usize,
    /// Indent unit, repeated `indent` times at the head of each fresh line
    unit: String,
    /// Single-line mode counter. Zero means multi-line mode.
    single_line: usize,
    /// One-shot flag: the next `append` continues the current line.
    continue_line: bool,
}

impl LineWriter {
    /// Create a [LineWriter] with indent-unit `unit`.
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Default::default()
        }
    }
    /// Append `s`.
    /// In multi-line mode this flushes any current line and opens a new one at
    /// the current indent. In single-line mode, or when [LineWriter::same_line]
    /// was signaled, `s` extends the current line instead.
    pub fn append(&mut self, s: &str) {
        if self.single_line > 0 || self.continue_line {
            self.current.push_str(s);
        } else {
            self.flush();
            self.current = self.unit.repeat(self.indent);
            self.current.push_str(s);
        }
        self.continue_line = false;
    }
    /// Flush the current line, then emit `s` verbatim as its own line, with no indent.
    /// Used for section banners.
    pub fn append_raw(&mut self, s: &str) {
        self.flush();
        self.lines.push(s.to_string());
        self.continue_line = false;
    }
    /// Signal that the next `append` continues the current line.
    pub fn same_line(&mut self) {
        self.continue_line = true;
    }
    /// Increase the indent depth.
    pub fn increase_indent(&mut self) {
        self.indent += 1;
    }
    /// Decrease the indent depth. Decreasing below zero is a contract violation.
    pub fn decrease_indent(&mut self) {
        assert!(self.indent > 0, "LineWriter indent decreased below zero");
        self.indent -= 1;
    }
    /// Enter single-line mode. Balanced with [LineWriter::pop_single_line].
    pub fn push_single_line(&mut self) {
        self.single_line += 1;
    }
    /// Leave one level of single-line mode. Popping below zero is a contract violation.
    pub fn pop_single_line(&mut self) {
        assert!(self.single_line > 0, "LineWriter single-line popped below zero");
        self.single_line -= 1;
    }
    /// Boolean indication of single-line mode.
    pub fn is_single_line(&self) -> bool {
        self.single_line > 0
    }
    /// Return all completed lines, plus the current partial line if non-empty.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.lines.clone();
        if !self.current.is_empty() {
            lines.push(self.current.clone());
        }
        lines
    }
    /// Consume the writer, producing its full output terminated by a newline.
    pub fn finish(mut self) -> String {
        self.flush();
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
    /// Complete the current partial line, if any.
    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_line() {
        let mut w = LineWriter::new("\t");
        w.append("{");
        w.increase_indent();
        w.append("foo");
        w.same_line();
        w.append(" = bar;");
        w.decrease_indent();
        w.append("}");
        assert_eq!(w.finish(), "{\n\tfoo = bar;\n}\n");
    }
    #[test]
    fn test_single_line() {
        let mut w = LineWriter::new("\t");
        w.append("x = ");
        w.push_single_line();
        w.append("{");
        w.append("isa = Y; ");
        w.append("}");
        w.pop_single_line();
        w.same_line();
        w.append(";");
        assert_eq!(w.finish(), "x = {isa = Y; };\n");
    }
    #[test]
    fn test_raw_lines() {
        let mut w = LineWriter::new("  ");
        w.increase_indent();
        w.append("a");
        w.append_raw("");
        w.append_raw("/* banner */");
        w.append("b");
        assert_eq!(w.lines(), vec!["  a", "", "/* banner */", "  b"]);
    }
}
