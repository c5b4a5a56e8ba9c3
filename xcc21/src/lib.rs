//!
//! # Xcc21 Xcode Build-Configuration Parser & Writer
//!
//! `.xcconfig` files hold build settings as line-oriented text: plain
//! `KEY = value` assignments, conditional assignments such as
//! `KEY[sdk=iphoneos][arch=arm64] = value`, `#include` directives pulling in
//! further configuration files, and `//` comments.
//!
//! Xcc21 keeps two representations of each file:
//!
//! * The [Line] list, in file order, is the source of truth for round-trip
//!   fidelity: a parsed file renders back byte-identically, up to the
//!   normalization of one space after `//`.
//! * A derived [ConfigTree] indexes every setting by
//!   `(configuration, sdk, architecture, key)` for lookup. Includes overlay
//!   transitively, in line order, so a file's own settings override what it
//!   includes. The tree is rebuilt from scratch on any mutation, and every
//!   downstream file (one that includes this one) rebuilds with it.
//!
//! Include resolution threads a bucket of already-loaded files through the
//! recursion, so include cycles terminate and diamonds load each file once.
//!
//! ## Usage
//!
//! ```skip
//! use xcc21::Configuration;
//! let config = Configuration::open("Release.xcconfig", true)?;
//! let values = config.read()?.value_for_key("OTHER_LDFLAGS", "*", "*", "*");
//! ```
//!

// Xcode21 imports & re-exports
pub(crate) use xcode21utils as utils;
pub use utils::{Ptr, SerdeFile, SerializationFormat, WeakPtr};

// Local modules & re-exports
pub mod data;
#[doc(inline)]
pub use data::*;
pub mod tree;
pub use tree::*;
mod read;
mod write;

// Unit tests
#[cfg(test)]
mod tests;
