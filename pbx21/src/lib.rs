//!
//! # Pbx21 Xcode Project-File Parser & Writer
//!
//! `project.pbxproj` is the ASCII property-list file at the heart of every
//! Xcode project bundle. Pbx21 is a library for reading, manipulating, and
//! writing these files byte-stably: a file parsed and re-rendered without
//! mutation is returned exactly as the IDE wrote it, comments included.
//!
//! The file is represented in three layers:
//!
//! * A *value tree* of [Literal]s, ordered [Dict]s, and arrays, exactly
//!   mirroring the on-disk property list.
//! * An *object graph*: the root `objects` dictionary is a flat map of
//!   records keyed by 24-hex-digit identifiers. After parsing, every
//!   identifier string embedded in the tree is linked to a strong reference
//!   onto its record, and each record tracks its referrers through weak
//!   back-edges. Records are bucketed into [Sections] by their `isa` type tag.
//! * A [PbxProject], which owns the graph and exposes the mutation API:
//!   object creation and removal (removal purges every embedded reference),
//!   file-reference and group management, source-tree path resolution, and
//!   enumeration of child projects.
//!
//! ## Usage
//!
//! Opening a project from its `.xcodeproj` bundle, inspecting an object, and
//! writing the file back:
//!
//! ```skip
//! use pbx21::PbxProject;
//! let mut project = PbxProject::open("MyApp.xcodeproj")?;
//! let root = project.root_object()?;
//! project.write(None)?;
//! ```
//!

// Xcode21 imports & re-exports
pub(crate) use xcode21utils as utils;
pub use utils::{ErrorContext, OrderedMap, Ptr, WeakPtr};

// Local modules & re-exports
pub mod data;
#[doc(inline)]
pub use data::*;
mod link;
mod read;
mod write;
pub use read::parse_str;
pub use write::render;
pub mod project;
pub use project::*;
