//!
//! # Configuration Reading Module
//!
//! Line-oriented parser. Each logical line is parsed in isolation; file-level
//! parsing numbers the lines for error reporting. Include resolution happens
//! at load time in `data.rs`, not here.
//!

// Xcode21 Imports
use crate::utils::{EnumStr, ErrorHelper, Scanner};

// Local imports
use super::data::*;

/// Upper bound on source context included in parse errors.
const ERROR_CONTEXT_CHARS: usize = 20;

/// Characters permitted in a setting key.
fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse configuration content `src` into its logical lines.
pub(crate) fn parse_str(src: &str) -> XccResult<Vec<Line>> {
    src.lines()
        .enumerate()
        .map(|(index, line)| {
            parse_line(line).map_err(|e| match e {
                XccError::Parse { msg, found, .. } => XccError::Parse {
                    line: index + 1,
                    msg,
                    found,
                },
                other => other,
            })
        })
        .collect()
}

/// Parse one logical line.
pub(crate) fn parse_line(src: &str) -> XccResult<Line> {
    LineParser::new(src).parse()
}

/// # Line Parser
struct LineParser<'src> {
    scan: Scanner<'src>,
}

impl ErrorHelper for LineParser<'_> {
    type Error = XccError;
    /// Parse errors carry the expected-token description and the upcoming
    /// source context. The line number is filled in by `parse_str`.
    fn err(&self, msg: impl Into<String>) -> Self::Error {
        XccError::Parse {
            line: 0,
            msg: msg.into(),
            found: self.scan.context(ERROR_CONTEXT_CHARS),
        }
    }
}

impl<'src> LineParser<'src> {
    fn new(src: &'src str) -> Self {
        Self {
            scan: Scanner::new(src),
        }
    }
    /// Dispatch on the line kind: empty, comment, include, or setting.
    fn parse(&mut self) -> XccResult<Line> {
        self.scan.skip_whitespace();
        if self.scan.done() {
            return Ok(Line::Empty);
        }
        if self.scan.scan_string("//") {
            return Ok(Line::Comment(strip_comment(self.scan.rest())));
        }
        if self.scan.scan_string("#include") {
            return self.parse_include();
        }
        self.parse_setting()
    }
    /// Parse the remainder of an `#include` / `#include?` directive.
    fn parse_include(&mut self) -> XccResult<Line> {
        let optional = self.scan.accept_char('?');
        self.scan.skip_whitespace();
        if !self.scan.accept_char('"') {
            return self.fail("opening `\"` in include");
        }
        let path = match self.scan.scan_up_to("\"") {
            Some(path) => path.to_string(),
            None => return self.fail("closing `\"` in include"),
        };
        self.scan.accept_char('"');
        self.scan.skip_whitespace();
        if !self.scan.done() {
            return self.fail("end of line after include");
        }
        Ok(Line::Include(Include {
            path,
            optional,
            resolved: None,
            loaded: None,
        }))
    }
    /// Parse a `KEY[cond=val]... = value value ... // comment` setting.
    fn parse_setting(&mut self) -> XccResult<Line> {
        let key = self.scan.scan_while(is_key_char).to_string();
        if key.is_empty() {
            return self.fail("setting key");
        }
        let mut conditionals = Conditionals::new();
        while self.scan.accept_char('[') {
            // An empty `[]` terminates the conditional list
            if self.scan.accept_char(']') {
                break;
            }
            let name = self.scan.scan_while(|c| c != '=' && c != ']').to_string();
            if !self.scan.accept_char('=') {
                return self.fail("`=` in conditional");
            }
            // The first `=` split the name; the value may contain more
            let value = self.scan.scan_while(|c| c != ']').to_string();
            if !self.scan.accept_char(']') {
                return self.fail("`]`");
            }
            let name = match ConditionalName::from_str(&name) {
                Some(name) => name,
                None => return self.fail("conditional name `config`, `sdk`, or `arch`"),
            };
            conditionals.set(name, value);
        }
        self.scan.skip_whitespace();
        if !self.scan.accept_char('=') {
            return self.fail("`=`");
        }
        let mut values = Vec::new();
        let mut comment = None;
        loop {
            self.scan.skip_whitespace();
            if self.scan.done() {
                break;
            }
            if self.scan.scan_string("//") {
                comment = Some(strip_comment(self.scan.rest()));
                break;
            }
            if self.scan.accept_char('"') {
                values.push(self.parse_quoted()?);
            } else {
                values.push(self.parse_token());
            }
        }
        Ok(Line::Setting(Setting {
            key,
            conditionals,
            values,
            comment,
        }))
    }
    /// Parse a quoted value body. The opening `"` has been consumed.
    fn parse_quoted(&mut self) -> XccResult<String> {
        let mut out = String::new();
        loop {
            match self.scan.next_char() {
                None => return self.fail("closing `\"` in value"),
                Some('"') => return Ok(out),
                Some('\\') => match self.scan.next_char() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(_) => return self.fail("escape of `n`, `t`, `\"`, or `\\`"),
                    None => return self.fail("escaped character"),
                },
                Some(c) => out.push(c),
            }
        }
    }
    /// Scan an unquoted value token: terminated by whitespace, `//`, or the
    /// end of the line.
    fn parse_token(&mut self) -> String {
        let mut token = String::new();
        while let Some(c) = self.scan.peek_char() {
            if c.is_whitespace() || self.scan.rest().starts_with("//") {
                break;
            }
            token.push(c);
            self.scan.next_char();
        }
        token
    }
}

/// Comment text after `//`, with one leading space stripped.
fn strip_comment(text: &str) -> String {
    text.strip_prefix(' ').unwrap_or(text).to_string()
}
