//!
//! # Configuration Data Model
//!

// Std-Lib
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// Crates.io Imports
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

// Xcode21 Imports
use crate::utils::{
    canonicalize, enumstr, write_atomic, EnumStr, OrderedMap, Ptr, SerdeFile, WeakPtr,
};

// Local imports
use super::tree::{ConfigTree, Content};
use super::{read, write};

enumstr!(
    /// # Conditional Names
    ///
    /// The closed alphabet of setting qualifiers. A conditional not written
    /// on a setting defaults to `*`.
    ConditionalName {
        Config: "config",
        Sdk: "sdk",
        Arch: "arch",
    }
);

/// The conditional qualifiers of one setting, in written order.
/// Only explicitly written conditionals are stored; lookups default the rest
/// to `*`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditionals(OrderedMap<ConditionalName, String>);

impl Conditionals {
    /// Create an empty set of conditionals (everything defaults to `*`).
    pub fn new() -> Self {
        Self::default()
    }
    /// The value of conditional `name`, defaulting to `*`.
    pub fn get(&self, name: ConditionalName) -> &str {
        self.0.get(&name).map(String::as_str).unwrap_or("*")
    }
    /// Set conditional `name` to `value`, preserving first-written order.
    pub fn set(&mut self, name: ConditionalName, value: impl Into<String>) {
        self.0.insert(name, value.into());
    }
    /// Iterate the written conditionals in order.
    pub fn iter(&self) -> impl Iterator<Item = (ConditionalName, &str)> {
        self.0.iter().map(|(name, value)| (*name, value.as_str()))
    }
    /// Boolean indication of no written conditionals.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An `#include` directive: the path as written, the `?` optionality flag,
/// the URL it resolved to, and the loaded file when include resolution ran
/// and succeeded. A failed optional include stays loaded-less.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Include {
    /// Included path, as written between the quotes
    pub path: String,
    /// Whether the directive was `#include?`
    pub optional: bool,
    /// Resolved URL, relative to the including file's directory
    pub resolved: Option<PathBuf>,
    /// The loaded configuration; owned by the outermost loader
    #[serde(skip)]
    pub loaded: Option<WeakPtr<Configuration>>,
}

/// A `KEY[cond=val]... = value value ...` setting line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub conditionals: Conditionals,
    pub values: Vec<String>,
    /// Trailing `//` comment, one leading space stripped
    pub comment: Option<String>,
}

/// One logical line of a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Line {
    /// Whitespace-only line
    Empty,
    /// `// ...` comment line, one leading space stripped
    Comment(String),
    /// `#include "..."` or `#include? "..."` directive
    Include(Include),
    /// Setting assignment
    Setting(Setting),
}
impl SerdeFile for Vec<Line> {}

/// Bucket of loaded files threaded through include resolution, keyed by
/// canonical URL. Prevents include cycles from recursing and diamonds from
/// re-loading.
type IncludesBucket = OrderedMap<PathBuf, Ptr<Configuration>>;

///
/// # Configuration
///
/// A loaded `.xcconfig` file: its source URL, its [Line] list (the
/// round-trip source of truth), the derived [ConfigTree] lookup index, and
/// the set of downstream files that include it.
///
#[derive(Debug, Default)]
pub struct Configuration {
    /// Source file URL
    path: PathBuf,
    /// Logical lines, in file order
    lines: Vec<Line>,
    /// Derived `(config, sdk, arch, key)` index; rebuilt on any mutation
    tree: ConfigTree,
    /// Files that include this one (weak)
    downstream: Vec<WeakPtr<Configuration>>,
    /// Included files owned on behalf of the include graph.
    /// Populated only on the outermost loaded file.
    included: IncludesBucket,
}

impl Configuration {
    /// Open the configuration file at `path`. With `includes`, `#include`
    /// directives are resolved and loaded transitively; a failing
    /// `#include?` degrades to "not loaded", while a failing `#include`
    /// propagates its error.
    pub fn open(path: impl AsRef<Path>, includes: bool) -> XccResult<Ptr<Configuration>> {
        let path = path.as_ref();
        let mut bucket = IncludesBucket::new();
        let this = Self::load(path, includes, &mut bucket)?;
        // The outermost file owns the rest of the graph, but not itself
        bucket.shift_remove(&canonicalize(path));
        this.write()?.included = bucket;
        Ok(this)
    }
    /// Parse configuration content `src` with `path` as its source URL.
    /// Includes are left unresolved.
    pub fn from_source(src: &str, path: impl Into<PathBuf>) -> XccResult<Ptr<Configuration>> {
        let lines = read::parse_str(src)?;
        let this = Ptr::new(Configuration {
            path: path.into(),
            lines,
            ..Default::default()
        });
        Self::update_tree(&this)?;
        Ok(this)
    }
    /// Load `path` into `bucket`, recursing into its includes.
    fn load(path: &Path, includes: bool, bucket: &mut IncludesBucket) -> XccResult<Ptr<Configuration>> {
        let canonical = canonicalize(path);
        debug!("loading configuration {}", canonical.display());
        let src = std::fs::read_to_string(&canonical)?;
        let mut lines = read::parse_str(&src)?;
        let this = Ptr::new(Configuration {
            path: canonical.clone(),
            ..Default::default()
        });
        // Register before resolving includes, so a cyclic include links back
        // here instead of recursing
        bucket.insert(canonical.clone(), this.clone());
        let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
        for line in lines.iter_mut() {
            let include = match line {
                Line::Include(include) => include,
                _ => continue,
            };
            let resolved = canonicalize(&dir.join(&include.path));
            include.resolved = Some(resolved.clone());
            if !includes {
                continue;
            }
            trace!("resolving include {}", resolved.display());
            let target = match bucket.get(&resolved) {
                Some(existing) => Some(existing.clone()),
                None => match Self::load(&resolved, includes, bucket) {
                    Ok(target) => Some(target),
                    Err(_) if include.optional => None,
                    Err(e) => return Err(e),
                },
            };
            if let Some(target) = target {
                include.loaded = Some(target.downgrade());
                if target != this {
                    target.write()?.register_downstream(&this);
                }
            }
        }
        this.write()?.lines = lines;
        Self::update_tree(&this)?;
        Ok(this)
    }
    /// The source file URL.
    pub fn path(&self) -> &Path {
        &self.path
    }
    /// The logical lines, in file order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
    /// Render the configuration to its file content.
    pub fn content(&self) -> String {
        write::render(&self.lines)
    }
    /// Write the rendered configuration to `to`, or atomically replace the
    /// source file when `to` is `None`.
    pub fn write(&self, to: Option<&Path>) -> XccResult<()> {
        let target = to.unwrap_or(&self.path);
        debug!("writing configuration to {}", target.display());
        write_atomic(target, &self.content())?;
        Ok(())
    }
    /// Look up the values stored at `(config, sdk, arch, key)`.
    /// The coordinates are literal: `*` matches only entries stored at `*`.
    pub fn value_for_key(&self, key: &str, config: &str, sdk: &str, arch: &str) -> Option<&[String]> {
        self.tree.get(key, config, sdk, arch).map(|c| c.values.as_slice())
    }
    /// The [Content] stored at `(config, sdk, arch, key)`, including its
    /// defining file.
    pub fn content_for_key(&self, key: &str, config: &str, sdk: &str, arch: &str) -> Option<&Content> {
        self.tree.get(key, config, sdk, arch)
    }
    /// Remove the tree entry at `(config, sdk, arch, key)`, dropping layers
    /// as they empty. Only the derived index changes; the line list does not.
    pub fn remove_value(&mut self, key: &str, config: &str, sdk: &str, arch: &str) -> Option<Content> {
        self.tree.remove(key, config, sdk, arch)
    }
    /// The included files this (outermost-loaded) configuration owns.
    pub fn included(&self) -> Vec<Ptr<Configuration>> {
        self.included.values().cloned().collect()
    }
    /// The still-live downstream files, i.e. those that include this one.
    pub fn downstream(&self) -> Vec<Ptr<Configuration>> {
        self.downstream.iter().filter_map(WeakPtr::upgrade).collect()
    }
    /// Register `file` as downstream of `self`.
    pub(crate) fn register_downstream(&mut self, file: &Ptr<Configuration>) {
        if !self.downstream.iter().any(|weak| weak.ptr_eq(file)) {
            self.downstream.push(file.downgrade());
        }
    }

    /// Append `line` and re-derive the tree, ours and every downstream's.
    pub fn append_line(this: &Ptr<Configuration>, line: Line) -> XccResult<()> {
        this.write()?.lines.push(line);
        Self::update_tree(this)
    }
    /// Remove the line at `index` and re-derive the tree, ours and every
    /// downstream's.
    pub fn remove_line(this: &Ptr<Configuration>, index: usize) -> XccResult<Line> {
        let removed = {
            let mut cfg = this.write()?;
            if index >= cfg.lines.len() {
                return Err(XccError::Str(format!("no line at index {}", index)));
            }
            cfg.lines.remove(index)
        };
        Self::update_tree(this)?;
        Ok(removed)
    }

    /// Rebuild this file's tree from its line list, then broadcast the
    /// rebuild through the downstream graph. A visited set bounds the
    /// broadcast on cyclic include graphs.
    pub fn update_tree(this: &Ptr<Configuration>) -> XccResult<()> {
        let mut visited = HashSet::new();
        Self::rebuild(this, &mut visited)
    }
    fn rebuild(this: &Ptr<Configuration>, visited: &mut HashSet<Ptr<Configuration>>) -> XccResult<()> {
        visited.insert(this.clone());
        let mut tree = ConfigTree::new();
        {
            let cfg = this.read()?;
            for line in &cfg.lines {
                match line {
                    Line::Setting(setting) => {
                        tree.insert(
                            setting.conditionals.get(ConditionalName::Config),
                            setting.conditionals.get(ConditionalName::Sdk),
                            setting.conditionals.get(ConditionalName::Arch),
                            &setting.key,
                            Content {
                                source: this.downgrade(),
                                values: setting.values.clone(),
                            },
                        );
                    }
                    Line::Include(include) => {
                        let target = include.loaded.as_ref().and_then(WeakPtr::upgrade);
                        if let Some(target) = target {
                            if target != *this {
                                tree.overlay(&target.read()?.tree);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        this.write()?.tree = tree;
        let downstream = this.read()?.downstream();
        for file in downstream {
            if !visited.contains(&file) {
                Self::rebuild(&file, visited)?;
            }
        }
        Ok(())
    }
}

/// # Xcc Error Enumeration
#[derive(Debug)]
pub enum XccError {
    /// Parser errors: source line, expected-token description, and context
    Parse {
        line: usize,
        msg: String,
        found: String,
    },
    /// Lock-acquisition failure.
    /// Generally caused by a [std::sync::PoisonError], which is not forwardable due to lifetime constraints.
    PtrLock,
    /// Wrapped errors, generally from other crates
    Boxed(Box<dyn std::error::Error>),
    /// String message-valued errors
    Str(String),
}
impl From<std::io::Error> for XccError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<crate::utils::ser::Error> for XccError {
    fn from(e: crate::utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl<T> From<std::sync::PoisonError<T>> for XccError {
    fn from(_e: std::sync::PoisonError<T>) -> Self {
        Self::PtrLock
    }
}
impl From<String> for XccError {
    /// Convert string-based errors by wrapping them
    fn from(e: String) -> Self {
        Self::Str(e)
    }
}
impl From<&str> for XccError {
    /// Convert string-based errors by wrapping them
    fn from(e: &str) -> Self {
        Self::Str(e.into())
    }
}
impl std::fmt::Display for XccError {
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for XccError {}

/// Xcc21 Library-Wide Result Type
pub type XccResult<T> = Result<T, XccError>;
