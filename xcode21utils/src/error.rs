//!
//! # Error-Helper Utilities
//!
//! Shared failure-handling for the parsers and renderers, each of which
//! walks a tree while carrying some state worth reporting on failure: the
//! plist parser its scanner position and key stack, the configuration
//! parser its source line, the renderer its message alone.
//!

///
/// # ErrorHelper
///
/// Helper trait for re-use among the tree-walkers.
/// Each implementer has some internal state to report upon failure, which it
/// injects in the implementation-required `err` method; the remaining
/// methods, provided by default, route failures through `err`.
///
/// A typical parser implementation attaches its position:
///
/// ```rust
/// use xcode21utils::error::ErrorHelper;
///
/// struct Parser {
///     line: usize,
/// }
/// impl ErrorHelper for Parser {
///     type Error = String;
///
///     fn err(&self, msg: impl Into<String>) -> Self::Error {
///         format!("expected {} at line {}", msg.into(), self.line)
///     }
/// }
///
/// let parser = Parser { line: 4 };
/// assert!(parser.fail::<()>("`;`").is_err());
/// ```
///
pub trait ErrorHelper {
    type Error;

    /// Create and return a [Self::Error] value.
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Return failure
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Assert a boolean condition. Returns through `self.fail` if it is not satisfied.
    fn assert(&self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Walker {
        at: usize,
    }
    impl ErrorHelper for Walker {
        type Error = String;
        fn err(&self, msg: impl Into<String>) -> Self::Error {
            format!("{} at {}", msg.into(), self.at)
        }
    }

    #[test]
    fn test_fail_and_assert() {
        let walker = Walker { at: 7 };
        assert_eq!(walker.fail::<()>("bad token").unwrap_err(), "bad token at 7");
        assert!(walker.assert(true, "fine").is_ok());
        assert_eq!(walker.assert(false, "not fine").unwrap_err(), "not fine at 7");
    }
}
