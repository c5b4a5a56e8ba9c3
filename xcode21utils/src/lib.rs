//!
//! # Xcode21 Internal Utilities Crate
//!

pub mod ptr;
pub use ptr::*;

pub mod ordered;
pub use ordered::*;

pub mod writer;
pub use writer::*;

pub mod scan;
pub use scan::*;

pub mod ser;
pub use ser::*;

pub mod error;
pub use error::*;

pub mod context;
pub use context::*;

pub mod enumstr;
pub use enumstr::*;

pub mod paths;
pub use paths::*;
