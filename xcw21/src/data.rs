//!
//! # Workspace Data Model
//!

// Std-Lib
use std::path::{Path, PathBuf};

// Crates.io Imports
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

// Xcode21 Imports
use crate::utils::{canonicalize, relative_path, write_atomic, SerdeFile};

// Local imports
use super::{read, write};

///
/// # Xml Element
///
/// A fully owned XML element: name, attributes in document order, and child
/// elements. Text content does not occur in workspace manifests and is not
/// retained.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Element name
    pub name: String,
    /// Attributes, in document order
    pub attributes: Vec<(String, String)>,
    /// Child elements, in document order
    pub children: Vec<XmlElement>,
}
impl XmlElement {
    /// Create an empty element named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Get the value of attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
    /// Set attribute `name` to `value`, replacing any existing value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(attr) => attr.1 = value,
            None => self.attributes.push((name, value)),
        }
    }
}

/// A project gathered by the workspace: the resolved absolute URL of its
/// `.xcodeproj` bundle, the raw `location` attribute, and the position of the
/// backing `FileRef` node in the element tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReference {
    /// Canonical URL of the referenced `.xcodeproj` bundle
    pub url: PathBuf,
    /// The `location` attribute as written, prefix included
    pub location: String,
    /// Child-index trail of the backing node, from the root element
    #[serde(skip)]
    pub(crate) node: Vec<usize>,
}
impl SerdeFile for Vec<ProjectReference> {}

///
/// # Workspace
///
/// A loaded `contents.xcworkspacedata`: the owned root element, the source
/// path, and a lazily (re)built cache of the project references found by
/// recursive descent over the tree.
///
#[derive(Debug)]
pub struct Workspace {
    /// Root XML element, usually named `Workspace`
    pub(crate) root: XmlElement,
    /// Source file path, `<dir>/<name>.xcworkspace/contents.xcworkspacedata`
    path: PathBuf,
    /// Workspace directory: the bundle's parent, anchoring `container:` locations
    dir: PathBuf,
    /// Cached project references; `None` after a mutation
    refs: Option<Vec<ProjectReference>>,
}

impl Workspace {
    /// Open a [Workspace] from `path`: either the `.xcworkspace` bundle
    /// directory, or the `contents.xcworkspacedata` file inside it.
    pub fn open(path: impl AsRef<Path>) -> XcwResult<Self> {
        let path = path.as_ref();
        let file = if path
            .file_name()
            .map(|n| n == "contents.xcworkspacedata")
            .unwrap_or(false)
        {
            path.to_path_buf()
        } else {
            path.join("contents.xcworkspacedata")
        };
        let src = std::fs::read_to_string(&file)?;
        Self::from_source(&src, file)
    }
    /// Parse workspace content `src`, recording `path` as its source location.
    pub fn from_source(src: &str, path: impl Into<PathBuf>) -> XcwResult<Self> {
        let path = path.into();
        debug!("parsing workspace manifest {}", path.display());
        let root = read::parse_str(src)?;
        Ok(Self::with_root(root, path))
    }
    /// Create a new, empty [Workspace] to be written at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let mut root = XmlElement::new("Workspace");
        root.set_attribute("version", "1.0");
        Self::with_root(root, path.into())
    }
    fn with_root(root: XmlElement, path: PathBuf) -> Self {
        let bundle = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let dir = bundle.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            root,
            path,
            dir,
            refs: None,
        }
    }
    /// The source `contents.xcworkspacedata` path.
    pub fn path(&self) -> &Path {
        &self.path
    }
    /// The workspace directory anchoring `container:` locations.
    pub fn directory(&self) -> &Path {
        &self.dir
    }
    /// Read-only access to the root element.
    pub fn root(&self) -> &XmlElement {
        &self.root
    }
    /// Render the workspace to its file content.
    pub fn content(&self) -> String {
        write::render(&self.root)
    }
    /// Write the rendered workspace to `to`, or atomically replace the
    /// source file when `to` is `None`.
    pub fn write(&self, to: Option<&Path>) -> XcwResult<()> {
        let target = to.unwrap_or(&self.path);
        debug!("writing workspace manifest to {}", target.display());
        write_atomic(target, &self.content())?;
        Ok(())
    }

    /// The workspace's project references. The cache is rebuilt lazily after
    /// any mutation.
    pub fn references(&mut self) -> XcwResult<&[ProjectReference]> {
        if self.refs.is_none() {
            let refs = read::collect_references(&self.root, &self.dir);
            trace!("collected {} project references", refs.len());
            self.refs = Some(refs);
        }
        Ok(self.refs.as_deref().unwrap_or_default())
    }

    /// Append a `FileRef` for the project at `url`. With `absolute` the
    /// location is written as `absolute:`; otherwise as `group:` relative to
    /// the workspace directory.
    pub fn append_reference(&mut self, url: &Path, absolute: bool) -> XcwResult<()> {
        let end = self.root.children.len();
        self.insert_reference(url, absolute, end)
    }
    /// Insert a `FileRef` for the project at `url` at child `index` of the
    /// root element, clamped to the current child count.
    pub fn insert_reference(&mut self, url: &Path, absolute: bool, index: usize) -> XcwResult<()> {
        let location = if absolute {
            format!("absolute:{}", url.display())
        } else {
            format!("group:{}", relative_path(&self.dir, url).display())
        };
        let mut node = XmlElement::new("FileRef");
        node.set_attribute("location", location);
        let index = index.min(self.root.children.len());
        self.root.children.insert(index, node);
        self.refs = None;
        Ok(())
    }
    /// Remove the project reference resolving to `url`.
    /// Returns whether a reference was found and removed.
    pub fn remove_reference(&mut self, url: &Path) -> XcwResult<bool> {
        let want = canonicalize(url);
        let trail = self
            .references()?
            .iter()
            .find(|r| r.url == want)
            .map(|r| r.node.clone());
        match trail {
            Some(trail) => {
                self.detach(&trail)?;
                self.refs = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
    /// Remove `reference`, detaching its backing node.
    pub fn remove(&mut self, reference: &ProjectReference) -> XcwResult<()> {
        self.detach(&reference.node)?;
        self.refs = None;
        Ok(())
    }
    /// Detach the node at child-index `trail` from the tree.
    fn detach(&mut self, trail: &[usize]) -> XcwResult<()> {
        let (last, path) = match trail.split_last() {
            Some(split) => split,
            None => return Err(XcwError::Structure("empty node trail".to_string())),
        };
        let mut element = &mut self.root;
        for &index in path {
            element = element
                .children
                .get_mut(index)
                .ok_or_else(|| XcwError::Structure("stale node trail".to_string()))?;
        }
        if *last >= element.children.len() {
            return Err(XcwError::Structure("stale node trail".to_string()));
        }
        element.children.remove(*last);
        Ok(())
    }
}

/// # Xcw Error Enumeration
#[derive(Debug)]
pub enum XcwError {
    /// XML well-formedness failures
    Xml(roxmltree::Error),
    /// Structural errors in the element tree
    Structure(String),
    /// Wrapped errors, generally from other crates
    Boxed(Box<dyn std::error::Error>),
    /// String message-valued errors
    Str(String),
}
impl From<roxmltree::Error> for XcwError {
    fn from(e: roxmltree::Error) -> Self {
        Self::Xml(e)
    }
}
impl From<std::io::Error> for XcwError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<crate::utils::ser::Error> for XcwError {
    fn from(e: crate::utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<String> for XcwError {
    /// Convert string-based errors by wrapping them
    fn from(e: String) -> Self {
        Self::Str(e)
    }
}
impl From<&str> for XcwError {
    /// Convert string-based errors by wrapping them
    fn from(e: &str) -> Self {
        Self::Str(e.into())
    }
}
impl std::fmt::Display for XcwError {
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for XcwError {}

/// Xcw21 Library-Wide Result Type
pub type XcwResult<T> = Result<T, XcwError>;
