//!
//! # Pbx Reading Module
//!
//! Recursive-descent parser for the ASCII property-list dialect of
//! `project.pbxproj`. Produces the ordered [Dict] tree; reference linking is
//! a separate pass (see `link.rs`).
//!

// Xcode21 Imports
use crate::utils::{ErrorContext, ErrorHelper, Scanner};

// Local imports
use super::data::*;

/// Parse property-list content `src` from string.
/// The root element must be a dictionary.
pub fn parse_str(src: &str) -> PbxResult<Dict> {
    let mut parser = PbxParser::new(src);
    parser.parse_root()
}

/// Upper bound on source context included in parse errors.
const ERROR_CONTEXT_CHARS: usize = 20;

/// Characters permitted in an unquoted dictionary key.
fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}
/// Characters permitted in an unquoted string value.
pub(crate) fn is_value_char(c: char) -> bool {
    is_key_char(c) || c == '/'
}

/// # Pbx Parser
///
/// Transforms input text into the ordered [Dict] tree.
/// Whitespace and `/* ... */` comments are skipped before every token.
pub(crate) struct PbxParser<'src> {
    scan: Scanner<'src>,
    /// Context Stack
    ctx: Vec<ErrorContext>,
}

impl ErrorHelper for PbxParser<'_> {
    type Error = PbxError;
    /// Parse errors carry the expected-token description, the upcoming
    /// source context, and the context stack.
    fn err(&self, msg: impl Into<String>) -> Self::Error {
        PbxError::Parse {
            expected: msg.into(),
            found: self.scan.context(ERROR_CONTEXT_CHARS),
            ctx: self.ctx.clone(),
        }
    }
}

impl<'src> PbxParser<'src> {
    /// Construct a [PbxParser] of input-text `src`.
    pub(crate) fn new(src: &'src str) -> Self {
        Self {
            scan: Scanner::new(src),
            ctx: Vec::new(),
        }
    }
    /// Parse the root element: an optional `// !$*UTF8*$!` header, then the
    /// root dictionary. Trailing non-trivia content is an error.
    pub(crate) fn parse_root(&mut self) -> PbxResult<Dict> {
        self.scan.skip_whitespace();
        self.scan.scan_string("// !$*UTF8*$!");
        self.skip_trivia()?;
        if !self.scan.accept_char('{') {
            return self.fail("root dictionary");
        }
        let root = self.parse_dict()?;
        self.skip_trivia()?;
        self.assert(self.scan.done(), "end of input")?;
        Ok(root)
    }
    /// Parse dictionary entries. The opening `{` has been consumed.
    /// Every entry requires its trailing `;`.
    fn parse_dict(&mut self) -> PbxResult<Dict> {
        let mut dict = Dict::new();
        loop {
            self.skip_trivia()?;
            if self.scan.accept_char('}') {
                return Ok(dict);
            }
            let key = self.parse_key()?;
            self.ctx.push(ErrorContext::Dict(key.text().to_string()));
            self.skip_trivia()?;
            if !self.scan.accept_char('=') {
                return self.fail("`=`");
            }
            self.skip_trivia()?;
            let value = self.parse_value()?;
            self.skip_trivia()?;
            if !self.scan.accept_char(';') {
                return self.fail("`;`");
            }
            self.ctx.pop();
            dict.insert(key, value);
        }
    }
    /// Parse array elements. The opening `(` has been consumed.
    /// Every element requires its trailing `,`.
    fn parse_array(&mut self) -> PbxResult<Vec<Value>> {
        let mut array = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.scan.accept_char(')') {
                return Ok(array);
            }
            self.ctx.push(ErrorContext::Array);
            array.push(self.parse_value()?);
            self.skip_trivia()?;
            if !self.scan.accept_char(',') {
                return self.fail("`,`");
            }
            self.ctx.pop();
        }
    }
    /// Parse a dictionary key: a quoted string or a key-character run.
    fn parse_key(&mut self) -> PbxResult<Literal> {
        if self.scan.accept_char('"') {
            return Ok(Literal::from(self.parse_quoted()?));
        }
        let run = self.scan.scan_while(is_key_char);
        if run.is_empty() {
            return self.fail("dictionary key");
        }
        Ok(Literal::from(run))
    }
    /// Parse a value: dictionary, array, quoted string, or unquoted run.
    fn parse_value(&mut self) -> PbxResult<Value> {
        match self.scan.peek_char() {
            Some('{') => {
                self.scan.next_char();
                Ok(Value::Dict(self.parse_dict()?))
            }
            Some('(') => {
                self.scan.next_char();
                Ok(Value::Array(self.parse_array()?))
            }
            Some('"') => {
                self.scan.next_char();
                Ok(Value::from(self.parse_quoted()?))
            }
            _ => {
                let run = self.scan.scan_while(is_value_char);
                if run.is_empty() {
                    return self.fail("value");
                }
                Ok(Value::from(run))
            }
        }
    }
    /// Parse a quoted string body. The opening `"` has been consumed.
    /// Handles the `\n \t \" \\` escapes and decodes `&#HHHH;` hex entities.
    fn parse_quoted(&mut self) -> PbxResult<String> {
        let mut out = String::new();
        loop {
            match self.scan.next_char() {
                None => return self.fail("closing `\"`"),
                Some('"') => return Ok(out),
                Some('\\') => match self.scan.next_char() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(_) => return self.fail("escape of `n`, `t`, `\"`, or `\\`"),
                    None => return self.fail("escaped character"),
                },
                Some('&') => match self.parse_entity() {
                    Some(c) => out.push(c),
                    None => out.push('&'),
                },
                Some(c) => out.push(c),
            }
        }
    }
    /// Decode the remainder of a `&#HHHH;` hex entity. The `&` has been
    /// consumed. Restores the cursor and returns `None` on anything else.
    fn parse_entity(&mut self) -> Option<char> {
        let mark = self.scan.clone();
        if self.scan.accept_char('#') {
            let digits = self.scan.scan_while(|c| c.is_ascii_hexdigit());
            if !digits.is_empty() && self.scan.accept_char(';') {
                if let Some(c) = u32::from_str_radix(digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                {
                    return Some(c);
                }
            }
        }
        self.scan = mark;
        None
    }
    /// Skip whitespace and `/* ... */` comments. Comment contents are
    /// discarded. An unterminated comment is an error.
    fn skip_trivia(&mut self) -> PbxResult<()> {
        loop {
            self.scan.skip_whitespace();
            if !self.scan.scan_string("/*") {
                return Ok(());
            }
            if self.scan.scan_up_to("*/").is_none() {
                return self.fail("`*/` closing comment");
            }
            self.scan.scan_string("*/");
        }
    }
}
