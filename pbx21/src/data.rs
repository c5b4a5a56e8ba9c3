//!
//! # Pbx Data Model
//!
//! The value tree and object graph backing a parsed `project.pbxproj`.
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io Imports
use indexmap::Equivalent;
use once_cell::sync::Lazy;

// Xcode21 Imports
use crate::utils::{ErrorContext, OrderedMap, Ptr, WeakPtr};

/// Insertion-ordered dictionary of the property-list tree.
/// Keys compare and hash by their text alone, so a plain-string key and a
/// linked reference key with the same identifier address the same entry.
pub type Dict = OrderedMap<Literal, Value>;

/// Ordered map of one `isa` section: identifier key to owned object.
pub type Section = OrderedMap<Literal, Ptr<PbxObject>>;

///
/// # Literal
///
/// A leaf value: either a plain string, or a linked reference onto an object
/// in the project graph. Equality and hashing use only the text, so
/// `Literal::from("ABC")` and a reference with identifier `"ABC"` are the
/// same key. The `silent` flag suppresses the ` /* comment */` annotation for
/// that occurrence when rendering.
///
#[derive(Debug, Clone)]
pub enum Literal {
    /// Plain string
    Str(String),
    /// Reference to an object, by identifier
    Ref {
        id: String,
        target: WeakPtr<PbxObject>,
        silent: bool,
    },
}
impl Literal {
    /// Create a non-silent reference literal onto `target`.
    pub fn reference(id: impl Into<String>, target: &Ptr<PbxObject>) -> Self {
        Self::Ref {
            id: id.into(),
            target: target.downgrade(),
            silent: false,
        }
    }
    /// Create a reference literal with an explicit `silent` flag.
    pub(crate) fn reference_with_silence(
        id: impl Into<String>,
        target: &Ptr<PbxObject>,
        silent: bool,
    ) -> Self {
        Self::Ref {
            id: id.into(),
            target: target.downgrade(),
            silent,
        }
    }
    /// The text of this literal: the string itself, or the referenced identifier.
    pub fn text(&self) -> &str {
        match self {
            Self::Str(s) => s,
            Self::Ref { id, .. } => id,
        }
    }
    /// Boolean indication of the reference variant.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Ref { .. })
    }
    /// Boolean indication of comment suppression. Plain strings are never annotated.
    pub fn silent(&self) -> bool {
        match self {
            Self::Str(_) => true,
            Self::Ref { silent, .. } => *silent,
        }
    }
    /// Resolve the referenced object, if this is a reference and its target is alive.
    pub fn target(&self) -> Option<Ptr<PbxObject>> {
        match self {
            Self::Str(_) => None,
            Self::Ref { target, .. } => target.upgrade(),
        }
    }
}
impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<String> for Literal {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        self.text() == other.text()
    }
}
impl Eq for Literal {}
impl std::hash::Hash for Literal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.text().hash(state)
    }
}
/// Allow [Dict] and [Section] lookups directly by `&str`.
impl Equivalent<Literal> for str {
    fn equivalent(&self, key: &Literal) -> bool {
        self == key.text()
    }
}

///
/// # Value
///
/// Any value of the property-list tree. [Value::Object] and [Value::Sections]
/// occur only inside the root `objects` entry of a linked project; everywhere
/// else, objects appear as reference [Literal]s.
///
#[derive(Debug, Clone)]
pub enum Value {
    Literal(Literal),
    Dict(Dict),
    Array(Vec<Value>),
    Object(Ptr<PbxObject>),
    Sections(Sections),
}
impl Value {
    /// Get the literal variant, or `None`.
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            _ => None,
        }
    }
    /// Get the dictionary variant, or `None`.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }
    /// Get the dictionary variant mutably, or `None`.
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }
    /// Get the array variant, or `None`.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
    /// Get the array variant mutably, or `None`.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
    /// Get the sections variant, or `None`.
    pub fn as_sections(&self) -> Option<&Sections> {
        match self {
            Self::Sections(s) => Some(s),
            _ => None,
        }
    }
    /// Get the sections variant mutably, or `None`.
    pub fn as_sections_mut(&mut self) -> Option<&mut Sections> {
        match self {
            Self::Sections(s) => Some(s),
            _ => None,
        }
    }
    /// Insert `value` at `index` of an array value, clamped to its length.
    /// Returns `false` (and leaves `value` unused) on non-array values.
    pub fn insert(&mut self, value: Value, index: usize) -> bool {
        match self {
            Self::Array(a) => {
                let index = index.min(a.len());
                a.insert(index, value);
                true
            }
            _ => false,
        }
    }
    /// Append `value` to an array value.
    pub fn push(&mut self, value: Value) -> bool {
        let end = self.as_array().map(Vec::len).unwrap_or_default();
        self.insert(value, end)
    }
}
impl From<Literal> for Value {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Literal(Literal::from(s))
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Literal(Literal::from(s))
    }
}
impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Self::Dict(d)
    }
}
impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Self::Array(a)
    }
}

///
/// # Sections
///
/// Ordered map from `isa` name to [Section], each an ordered map from
/// identifier to object. This is the owning container of every [PbxObject]
/// in a project; all other occurrences are weak reference [Literal]s.
///
#[derive(Debug, Clone, Default)]
pub struct Sections(OrderedMap<String, Section>);

impl Sections {
    /// Create a new and initially empty [Sections].
    pub fn new() -> Self {
        Self::default()
    }
    /// Insert `object` into the section matching its `isa`, creating the
    /// section if needed. The section key is a non-silent reference literal.
    pub fn insert(&mut self, object: Ptr<PbxObject>) -> PbxResult<()> {
        let (isa, id) = {
            let obj = object.read()?;
            (obj.isa().to_string(), obj.id().to_string())
        };
        let key = Literal::reference(id, &object);
        self.0.entry(isa).or_default().insert(key, object);
        Ok(())
    }
    /// Remove the object with identifier `id` from the `isa` section.
    /// An emptied section is dropped. Returns the removed object, if any.
    pub fn remove(&mut self, isa: &str, id: &str) -> Option<Ptr<PbxObject>> {
        let section = self.0.get_mut(isa)?;
        let removed = section.shift_remove(id);
        if section.is_empty() {
            self.0.shift_remove(isa);
        }
        removed
    }
    /// Find the object with identifier `id`, searching every section.
    pub fn object(&self, id: &str) -> Option<Ptr<PbxObject>> {
        self.0.values().find_map(|section| section.get(id)).cloned()
    }
    /// Get the section for `isa`, if present.
    pub fn section(&self, isa: &str) -> Option<&Section> {
        self.0.get(isa)
    }
    /// Iterate over `(isa, section)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Section)> {
        self.0.iter()
    }
    /// Iterate over every object, in section then insertion order.
    pub fn objects(&self) -> impl Iterator<Item = &Ptr<PbxObject>> {
        self.0.values().flat_map(|section| section.values())
    }
    /// Total object count across all sections.
    pub fn len(&self) -> usize {
        self.0.values().map(Section::len).sum()
    }
    /// Boolean indication of an empty container.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// # Object Kind
///
/// Enumerated record types with specialized behavior. Looked up from the
/// `isa` tag through a registered table; unrecognized tags fall back to
/// [ObjectKind::Generic], which no-ops every specialization hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    BuildFile,
    FileReference,
    Group,
    VariantGroup,
    VersionGroup,
    Project,
    NativeTarget,
    AggregateTarget,
    LegacyTarget,
    TargetDependency,
    ContainerItemProxy,
    ReferenceProxy,
    BuildConfiguration,
    ConfigurationList,
    SourcesBuildPhase,
    FrameworksBuildPhase,
    ResourcesBuildPhase,
    HeadersBuildPhase,
    CopyFilesBuildPhase,
    ShellScriptBuildPhase,
    RezBuildPhase,
    Generic,
}

/// Registered `isa` to [ObjectKind] table.
static OBJECT_KINDS: Lazy<HashMap<&'static str, ObjectKind>> = Lazy::new(|| {
    use ObjectKind::*;
    let mut kinds = HashMap::new();
    kinds.insert("PBXBuildFile", BuildFile);
    kinds.insert("PBXFileReference", FileReference);
    kinds.insert("PBXGroup", Group);
    kinds.insert("PBXVariantGroup", VariantGroup);
    kinds.insert("XCVersionGroup", VersionGroup);
    kinds.insert("PBXProject", Project);
    kinds.insert("PBXNativeTarget", NativeTarget);
    kinds.insert("PBXAggregateTarget", AggregateTarget);
    kinds.insert("PBXLegacyTarget", LegacyTarget);
    kinds.insert("PBXTargetDependency", TargetDependency);
    kinds.insert("PBXContainerItemProxy", ContainerItemProxy);
    kinds.insert("PBXReferenceProxy", ReferenceProxy);
    kinds.insert("XCBuildConfiguration", BuildConfiguration);
    kinds.insert("XCConfigurationList", ConfigurationList);
    kinds.insert("PBXSourcesBuildPhase", SourcesBuildPhase);
    kinds.insert("PBXFrameworksBuildPhase", FrameworksBuildPhase);
    kinds.insert("PBXResourcesBuildPhase", ResourcesBuildPhase);
    kinds.insert("PBXHeadersBuildPhase", HeadersBuildPhase);
    kinds.insert("PBXCopyFilesBuildPhase", CopyFilesBuildPhase);
    kinds.insert("PBXShellScriptBuildPhase", ShellScriptBuildPhase);
    kinds.insert("PBXRezBuildPhase", RezBuildPhase);
    kinds
});

impl ObjectKind {
    /// Look up the kind registered for `isa`.
    pub fn from_isa(isa: &str) -> Self {
        OBJECT_KINDS.get(isa).copied().unwrap_or(ObjectKind::Generic)
    }
    /// Kinds whose records render on a single line.
    pub fn single_line(&self) -> bool {
        matches!(self, Self::BuildFile | Self::FileReference)
    }
    /// Kinds that contain file elements as `children`.
    pub fn is_group_container(&self) -> bool {
        matches!(self, Self::Group | Self::VariantGroup | Self::VersionGroup)
    }
    /// Kinds that are build phases.
    pub fn is_build_phase(&self) -> bool {
        matches!(
            self,
            Self::SourcesBuildPhase
                | Self::FrameworksBuildPhase
                | Self::ResourcesBuildPhase
                | Self::HeadersBuildPhase
                | Self::CopyFilesBuildPhase
                | Self::ShellScriptBuildPhase
                | Self::RezBuildPhase
        )
    }
    /// Kinds that live in a group hierarchy.
    pub fn is_file_element(&self) -> bool {
        matches!(
            self,
            Self::FileReference
                | Self::Group
                | Self::VariantGroup
                | Self::VersionGroup
                | Self::ReferenceProxy
        )
    }
}

///
/// # Pbx Object
///
/// A project record: an immutable `isa` type tag, an immutable 24-hex-digit
/// identifier, and a mutable `content` dictionary whose leading entry is the
/// `isa` itself. Objects additionally track their referrers through weak
/// back-edges, and cache their containing group or build phase when one
/// links to them.
///
#[derive(Debug)]
pub struct PbxObject {
    /// Record type tag
    isa: String,
    /// Identifier, unique across the owning project
    id: String,
    /// Record content. The first entry is always `isa`.
    pub content: Dict,
    /// Specialized behavior selector, derived from `isa`
    kind: ObjectKind,
    /// Weak back-edges from every object whose content references this one
    referenced_by: Vec<WeakPtr<PbxObject>>,
    /// Cached container: the parent group of a file element, or the build
    /// phase of a build file. Maintained by the reference hooks.
    parent: Option<WeakPtr<PbxObject>>,
    /// Externally-provided display name, used only for comment rendering.
    /// The loader sets this on the root `PBXProject` record, whose
    /// configuration-list comment carries the project name.
    name_hint: Option<String>,
}

impl PbxObject {
    /// Create a [PbxObject] with identifier `id` from `content`.
    /// Fails if `content` carries no `isa` entry; the `isa` entry is moved to
    /// the front of the dictionary if it is not already there.
    pub fn create(id: impl Into<String>, mut content: Dict) -> PbxResult<Self> {
        let isa = match content.get("isa").and_then(Value::as_literal) {
            Some(lit) => lit.text().to_string(),
            None => {
                return Err(PbxError::Create(
                    "missing `isa` entry building object".to_string(),
                ))
            }
        };
        if let Some(index) = content.get_index_of("isa") {
            content.move_index(index, 0);
        }
        let kind = ObjectKind::from_isa(&isa);
        Ok(Self {
            isa,
            id: id.into(),
            content,
            kind,
            referenced_by: Vec::new(),
            parent: None,
            name_hint: None,
        })
    }
    /// Generate a fresh identifier: twelve random bytes as uppercase hex.
    pub fn generate_id() -> String {
        use rand::RngCore;

        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        let mut id = String::with_capacity(24);
        for b in bytes.iter() {
            id.push_str(&format!("{:02X}", b));
        }
        id
    }
    /// The record type tag.
    pub fn isa(&self) -> &str {
        &self.isa
    }
    /// The record identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
    /// The specialized-behavior selector.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }
    /// Boolean indication of single-line rendering.
    pub fn render_single_line(&self) -> bool {
        self.kind.single_line()
    }
    /// Get the string value of content entry `key`, if it is a literal.
    pub fn string(&self, key: &str) -> Option<String> {
        self.content
            .get(key)
            .and_then(Value::as_literal)
            .map(|lit| lit.text().to_string())
    }
    /// Resolve the object referenced by content entry `key`, if any.
    pub fn object(&self, key: &str) -> Option<Ptr<PbxObject>> {
        self.content
            .get(key)
            .and_then(Value::as_literal)
            .and_then(Literal::target)
    }
    /// The cached containing group or build phase, if alive.
    pub fn parent(&self) -> Option<Ptr<PbxObject>> {
        self.parent.as_ref().and_then(WeakPtr::upgrade)
    }
    /// Set the display name used by comment rendering.
    pub(crate) fn set_name_hint(&mut self, name: impl Into<String>) {
        self.name_hint = Some(name.into());
    }
    /// Snapshot of still-live referrers. Stale weak entries are skipped.
    pub fn referenced_by(&self) -> Vec<Ptr<PbxObject>> {
        self.referenced_by
            .iter()
            .filter_map(WeakPtr::upgrade)
            .collect()
    }
    /// Boolean indication of whether `referrer` is registered as a back-edge.
    pub fn is_referenced_by(&self, referrer: &Ptr<PbxObject>) -> bool {
        self.referenced_by.iter().any(|weak| weak.ptr_eq(referrer))
    }
    /// React to a new reference from `referrer`: register the back-edge, and
    /// cache the referrer as our container where the kinds call for it.
    pub(crate) fn add_reference(&mut self, referrer: &Ptr<PbxObject>, referrer_kind: ObjectKind) {
        if !self.is_referenced_by(referrer) {
            self.referenced_by.push(referrer.downgrade());
        }
        let caches_parent = (self.kind == ObjectKind::BuildFile && referrer_kind.is_build_phase())
            || (self.kind.is_file_element() && referrer_kind.is_group_container());
        if caches_parent {
            self.parent = Some(referrer.downgrade());
        }
    }
    /// React to a dropped reference from `referrer`: unregister the back-edge
    /// and clear the container cache if it pointed at `referrer`.
    pub(crate) fn remove_reference(&mut self, referrer: &Ptr<PbxObject>) {
        self.referenced_by.retain(|weak| !weak.ptr_eq(referrer));
        if let Some(parent) = &self.parent {
            if parent.ptr_eq(referrer) {
                self.parent = None;
            }
        }
    }
    /// The inline `/* ... */` annotation for references onto this record, or
    /// `None` for records the IDE leaves unannotated.
    pub fn comment(&self) -> Option<String> {
        use ObjectKind::*;
        match self.kind {
            Project => Some("Project object".to_string()),
            BuildFile => {
                let file = self.object("fileRef").and_then(|file| {
                    file.read().ok().and_then(|file| file.comment())
                })?;
                match self.parent().and_then(|phase| {
                    phase.read().ok().and_then(|phase| phase.comment())
                }) {
                    Some(phase) => Some(format!("{} in {}", file, phase)),
                    None => Some(file),
                }
            }
            FileReference | ReferenceProxy | Group | VariantGroup | VersionGroup => {
                self.string("name").or_else(|| self.string("path"))
            }
            NativeTarget | AggregateTarget | LegacyTarget | BuildConfiguration => {
                self.string("name")
            }
            ConfigurationList => {
                let referrer = self.referenced_by().into_iter().next()?;
                let referrer = referrer.read().ok()?;
                let name = match referrer.kind {
                    Project => referrer.name_hint.clone(),
                    _ => referrer.string("name"),
                }?;
                Some(format!(
                    "Build configuration list for {} \"{}\"",
                    referrer.isa, name
                ))
            }
            SourcesBuildPhase => Some("Sources".to_string()),
            FrameworksBuildPhase => Some("Frameworks".to_string()),
            ResourcesBuildPhase => Some("Resources".to_string()),
            HeadersBuildPhase => Some("Headers".to_string()),
            RezBuildPhase => Some("Rez".to_string()),
            CopyFilesBuildPhase => self
                .string("name")
                .or_else(|| Some("CopyFiles".to_string())),
            ShellScriptBuildPhase => self
                .string("name")
                .or_else(|| Some("ShellScript".to_string())),
            TargetDependency => Some("PBXTargetDependency".to_string()),
            ContainerItemProxy => Some("PBXContainerItemProxy".to_string()),
            Generic => None,
        }
    }
}

/// # Pbx Error Enumeration
#[derive(Debug)]
pub enum PbxError {
    /// Parser errors: expected-token description, upcoming source text, and
    /// the parser's context stack
    Parse {
        expected: String,
        found: String,
        ctx: Vec<ErrorContext>,
    },
    /// Structural errors in the parsed tree or object graph
    Structure(String),
    /// Renderer errors
    Render(String),
    /// Object-creation errors
    Create(String),
    /// Lock-acquisition failure.
    /// Generally caused by a [std::sync::PoisonError], which is not forwardable due to lifetime constraints.
    PtrLock,
    /// Wrapped errors, generally from other crates
    Boxed(Box<dyn std::error::Error>),
    /// String message-valued errors
    Str(String),
}
impl From<std::io::Error> for PbxError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<crate::utils::ser::Error> for PbxError {
    fn from(e: crate::utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl<T> From<std::sync::PoisonError<T>> for PbxError {
    fn from(_e: std::sync::PoisonError<T>) -> Self {
        Self::PtrLock
    }
}
impl From<String> for PbxError {
    /// Convert string-based errors by wrapping them
    fn from(e: String) -> Self {
        Self::Str(e)
    }
}
impl From<&str> for PbxError {
    /// Convert string-based errors by wrapping them
    fn from(e: &str) -> Self {
        Self::Str(e.into())
    }
}
impl std::fmt::Display for PbxError {
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for PbxError {}

/// Pbx21 Library-Wide Result Type
pub type PbxResult<T> = Result<T, PbxError>;
