/// Enumerated parse and tree-walk contexts
/// Generally used for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
    /// Inside the dictionary entry for the named key
    Dict(String),
    /// Inside an array element
    Array,
    /// Inside the object with the given identifier
    Object(String),
    Unknown,
}
