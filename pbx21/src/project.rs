//!
//! # Pbx Project Module
//!
//! [PbxProject] owns a linked project graph and exposes the mutation API:
//! object creation and removal, file-reference and group management,
//! source-tree path resolution, and child-project enumeration.
//!

// Std-Lib
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

// Crates.io Imports
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

// Xcode21 Imports
use crate::utils::{canonicalize, enumstr, write_atomic, EnumStr, Ptr};

// Local imports
use super::data::*;
use super::{link, read, write};

enumstr!(
    /// # Source-Tree Anchors
    ///
    /// The symbolic anchor determining how a file element's relative `path`
    /// resolves. Unrecognized anchor strings behave as [SourceTree::Group].
    SourceTree {
        Group: "<group>",
        Absolute: "<absolute>",
        SourceRoot: "SOURCE_ROOT",
        BuiltProductsDir: "BUILT_PRODUCTS_DIR",
        SdkRoot: "SDKROOT",
        DeveloperDir: "DEVELOPER_DIR",
    }
);

/// A resolved file-element location: the display location string, and the
/// absolute filesystem URL for anchors that provide one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub location: String,
    pub url: Option<PathBuf>,
}

/// Options for [PbxProject::child_projects] enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumerateOptions {
    /// Recurse into the children of each child project
    pub deep: bool,
    /// Visit each project at most once, deduplicated by canonical URL
    pub once: bool,
}

///
/// # Pbx Project
///
/// A loaded `project.pbxproj`: the linked root dictionary, plus the source
/// path and the paths derived from it.
///
#[derive(Debug)]
pub struct PbxProject {
    /// Linked root dictionary. Its `objects` entry is a [Sections].
    root: Dict,
    /// Source file path, `<dir>/<name>.xcodeproj/project.pbxproj`
    path: PathBuf,
    /// Bundle directory, `<dir>/<name>.xcodeproj`
    bundle: PathBuf,
    /// Project directory: the bundle's parent
    dir: PathBuf,
    /// Project name: the bundle's stem
    name: String,
}

impl PbxProject {
    /// Open a [PbxProject] from `path`: either the `.xcodeproj` bundle
    /// directory, or the `project.pbxproj` file inside it.
    pub fn open(path: impl AsRef<Path>) -> PbxResult<Self> {
        let path = path.as_ref();
        let file = if path.file_name().map(|n| n == "project.pbxproj").unwrap_or(false) {
            path.to_path_buf()
        } else {
            path.join("project.pbxproj")
        };
        let src = std::fs::read_to_string(&file)?;
        Self::from_source(&src, file)
    }
    /// Parse and link project content `src`, recording `path` as its source
    /// `project.pbxproj` location.
    pub fn from_source(src: &str, path: impl Into<PathBuf>) -> PbxResult<Self> {
        let path = path.into();
        let bundle = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let dir = bundle.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = bundle
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        debug!("parsing project `{}` from {}", name, path.display());
        let mut root = read::parse_str(src)?;
        link::link_root(&mut root, &name)?;
        Ok(Self {
            root,
            path,
            bundle,
            dir,
            name,
        })
    }
    /// The source `project.pbxproj` path.
    pub fn path(&self) -> &Path {
        &self.path
    }
    /// The `.xcodeproj` bundle directory.
    pub fn bundle_path(&self) -> &Path {
        &self.bundle
    }
    /// The project directory, i.e. the bundle's parent.
    pub fn directory(&self) -> &Path {
        &self.dir
    }
    /// The project name.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Read-only access to the linked root dictionary.
    pub fn root(&self) -> &Dict {
        &self.root
    }
    /// Render the project to its file content.
    pub fn content(&self) -> PbxResult<String> {
        write::render_project(&self.root)
    }
    /// Write the rendered project to `to`, or atomically replace the source
    /// file when `to` is `None`.
    pub fn write(&self, to: Option<&Path>) -> PbxResult<()> {
        let target = to.unwrap_or(&self.path);
        debug!("writing project `{}` to {}", self.name, target.display());
        write_atomic(target, &self.content()?)?;
        Ok(())
    }

    /// The object sections under the root `objects` entry.
    pub fn sections(&self) -> PbxResult<&Sections> {
        self.root
            .get("objects")
            .and_then(Value::as_sections)
            .ok_or_else(|| PbxError::Structure("`objects` missing after link".to_string()))
    }
    /// Mutable access to the object sections.
    pub fn sections_mut(&mut self) -> PbxResult<&mut Sections> {
        self.root
            .get_mut("objects")
            .and_then(Value::as_sections_mut)
            .ok_or_else(|| PbxError::Structure("`objects` missing after link".to_string()))
    }
    /// Find the object with identifier `id`.
    pub fn object(&self, id: &str) -> Option<Ptr<PbxObject>> {
        self.sections().ok()?.object(id)
    }
    /// Find the object with identifier `id`, requiring its `isa` to match.
    pub fn object_of_isa(&self, id: &str, isa: &str) -> Option<Ptr<PbxObject>> {
        let object = self.object(id)?;
        let matches = object.read().map(|obj| obj.isa() == isa).unwrap_or(false);
        if matches {
            Some(object)
        } else {
            None
        }
    }
    /// The root `PBXProject` record.
    pub fn root_object(&self) -> PbxResult<Ptr<PbxObject>> {
        self.root
            .get("rootObject")
            .and_then(Value::as_literal)
            .and_then(Literal::target)
            .ok_or_else(|| PbxError::Structure("unresolved `rootObject`".to_string()))
    }
    /// The main group of the root object's group hierarchy.
    pub fn main_group(&self) -> PbxResult<Ptr<PbxObject>> {
        self.root_object()?
            .read()?
            .object("mainGroup")
            .ok_or_else(|| PbxError::Structure("unresolved `mainGroup`".to_string()))
    }

    /// Create an empty object with record type `isa` and a fresh identifier,
    /// and add it to the matching section.
    pub fn create_object(&mut self, isa: &str) -> PbxResult<Ptr<PbxObject>> {
        let mut content = Dict::new();
        content.insert(Literal::from("isa"), Value::from(isa));
        let object = PbxObject::create(self.fresh_id(), content)?;
        self.set_object(object)
    }
    /// Add `object` to the section matching its `isa`, replacing any object
    /// already registered under the same identifier.
    pub fn set_object(&mut self, object: PbxObject) -> PbxResult<Ptr<PbxObject>> {
        let ptr = Ptr::new(object);
        self.sections_mut()?.insert(ptr.clone())?;
        Ok(ptr)
    }
    /// Generate an identifier unused in this project.
    fn fresh_id(&self) -> String {
        loop {
            let id = PbxObject::generate_id();
            if self.object(&id).is_none() {
                return id;
            }
        }
    }

    /// Remove `target` from the project: delete its section entry, strip
    /// every occurrence of its identifier from every referrer's content, and
    /// unregister `target` as a referrer of the objects it references.
    /// Removal is idempotent after the first call.
    pub fn remove_object(&mut self, target: &Ptr<PbxObject>) -> PbxResult<()> {
        let (id, isa) = {
            let t = target.read()?;
            (t.id().to_string(), t.isa().to_string())
        };
        self.sections_mut()?.remove(&isa, &id);

        // Strip the identifier out of every live referrer, the object itself
        // included when it references its own id.
        // Snapshot first: the loop body re-locks `target`.
        let referrers = target.read()?.referenced_by();
        for referrer in referrers {
            strip_occurrences(&mut referrer.write()?.content, &id);
            target.write()?.remove_reference(&referrer);
        }

        // Sweep our own content, so other objects no longer list us as a
        // referrer.
        let mut embedded = Vec::new();
        collect_targets(&target.read()?.content, &mut embedded);
        for other in embedded {
            other.write()?.remove_reference(target);
        }
        strip_occurrences(&mut target.write()?.content, &id);
        Ok(())
    }

    /// Resolve the location of group `group` by walking its parent chain.
    pub fn resolve_group_path(&self, group: &Ptr<PbxObject>) -> PbxResult<ResolvedPath> {
        self.resolve_element(group)
    }
    /// Resolve the location of file reference `file_ref`; the walk continues
    /// into its parent group.
    pub fn resolve_file_reference_path(&self, file_ref: &Ptr<PbxObject>) -> PbxResult<ResolvedPath> {
        self.resolve_element(file_ref)
    }
    /// Shared parent-chain walk behind the path-resolution entry points.
    fn resolve_element(&self, element: &Ptr<PbxObject>) -> PbxResult<ResolvedPath> {
        let mut components: Vec<String> = Vec::new();
        let mut visited: HashSet<Ptr<PbxObject>> = HashSet::new();
        let mut cursor = Some(element.clone());
        while let Some(current) = cursor {
            if !visited.insert(current.clone()) {
                break;
            }
            let (path, source_tree, parent) = {
                let obj = current.read()?;
                (obj.string("path"), obj.string("sourceTree"), obj.parent())
            };
            if let Some(path) = path {
                if !path.is_empty() {
                    components.insert(0, path);
                }
            }
            let anchor = source_tree
                .as_deref()
                .and_then(SourceTree::from_str)
                .unwrap_or(SourceTree::Group);
            match anchor {
                // Pass through to the parent; the main group resolves at the
                // project directory below.
                SourceTree::Group => cursor = parent,
                SourceTree::SourceRoot => {
                    let location = components.join("/");
                    let url = canonicalize(&self.dir.join(&location));
                    return Ok(ResolvedPath {
                        location,
                        url: Some(url),
                    });
                }
                SourceTree::Absolute => {
                    let location = components.join("/");
                    let url = canonicalize(Path::new(&location));
                    return Ok(ResolvedPath {
                        location,
                        url: Some(url),
                    });
                }
                SourceTree::SdkRoot => {
                    return Ok(ResolvedPath {
                        location: format!("/{}", components.join("/")),
                        url: None,
                    })
                }
                SourceTree::BuiltProductsDir => {
                    return Ok(ResolvedPath {
                        location: format!("$(BUILT_PRODUCTS_DIR)/{}", components.join("/")),
                        url: None,
                    })
                }
                SourceTree::DeveloperDir => {
                    return Ok(ResolvedPath {
                        location: format!("$(DEVELOPER_DIR)/{}", components.join("/")),
                        url: None,
                    })
                }
            }
        }
        let location = components.join("/");
        let url = canonicalize(&self.dir.join(&location));
        Ok(ResolvedPath {
            location,
            url: Some(url),
        })
    }

    /// Find the group whose resolved URL equals `directory`, optionally
    /// creating the missing chain of intermediate groups beneath the deepest
    /// existing ancestor (or the main group).
    pub fn group_for(
        &mut self,
        directory: &Path,
        create_intermediates: bool,
    ) -> PbxResult<Ptr<PbxObject>> {
        let want = canonicalize(directory);
        let candidates: Vec<Ptr<PbxObject>> = self
            .sections()?
            .section("PBXGroup")
            .map(|section| section.values().cloned().collect())
            .unwrap_or_default();
        // Deepest existing group whose URL is a prefix of the directory
        let mut best: Option<(Ptr<PbxObject>, PathBuf)> = None;
        for group in candidates {
            if let Some(url) = self.resolve_group_path(&group)?.url {
                if want.starts_with(&url) {
                    let deeper = best
                        .as_ref()
                        .map(|(_, at)| url.components().count() > at.components().count())
                        .unwrap_or(true);
                    if deeper {
                        best = Some((group, url));
                    }
                }
            }
        }
        let (mut group, at) = match best {
            Some(found) => found,
            None => {
                return Err(PbxError::Structure(format!(
                    "no group reaches directory {}",
                    want.display()
                )))
            }
        };
        if at == want {
            return Ok(group);
        }
        if !create_intermediates {
            return Err(PbxError::Structure(format!(
                "no group for directory {}",
                want.display()
            )));
        }
        let suffix = want
            .strip_prefix(&at)
            .map_err(|_| PbxError::Structure("directory outside the group tree".to_string()))?
            .to_path_buf();
        for component in suffix.components() {
            let name = component.as_os_str().to_string_lossy().to_string();
            let child = self.create_object("PBXGroup")?;
            {
                let mut obj = child.write()?;
                obj.content
                    .insert(Literal::from("children"), Value::Array(Vec::new()));
                obj.content.insert(Literal::from("path"), Value::from(name));
                obj.content
                    .insert(Literal::from("sourceTree"), Value::from("<group>"));
            }
            self.attach_child(&group, &child)?;
            group = child;
        }
        Ok(group)
    }
    /// Create (or find) the group chain for `directory`.
    pub fn create_group(&mut self, directory: &Path) -> PbxResult<Ptr<PbxObject>> {
        self.group_for(directory, true)
    }

    /// Create a `PBXFileReference` for `file`, filed under the group matching
    /// its parent directory (intermediate groups are created as needed).
    pub fn create_file_reference(&mut self, file: &Path) -> PbxResult<Ptr<PbxObject>> {
        let file = canonicalize(file);
        let parent = file
            .parent()
            .ok_or_else(|| PbxError::Str("file path has no parent directory".to_string()))?
            .to_path_buf();
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PbxError::Str("file path has no file name".to_string()))?
            .to_string();
        let group = self.group_for(&parent, true)?;
        let file_ref = self.create_object("PBXFileReference")?;
        {
            let mut obj = file_ref.write()?;
            let file_type = file
                .extension()
                .and_then(|e| e.to_str())
                .and_then(file_type_for_extension);
            if let Some(file_type) = file_type {
                obj.content
                    .insert(Literal::from("lastKnownFileType"), Value::from(file_type));
            }
            obj.content.insert(Literal::from("path"), Value::from(name));
            obj.content
                .insert(Literal::from("sourceTree"), Value::from("<group>"));
        }
        self.attach_child(&group, &file_ref)?;
        Ok(file_ref)
    }
    /// Find the file reference resolving to `file`, if any.
    pub fn search_file_reference(&self, file: &Path) -> PbxResult<Option<Ptr<PbxObject>>> {
        self.search_section("PBXFileReference", file)
    }
    /// Find the group resolving to `directory`, if any.
    pub fn search_group(&self, directory: &Path) -> PbxResult<Option<Ptr<PbxObject>>> {
        self.search_section("PBXGroup", directory)
    }
    fn search_section(&self, isa: &str, path: &Path) -> PbxResult<Option<Ptr<PbxObject>>> {
        let want = canonicalize(path);
        let candidates: Vec<Ptr<PbxObject>> = self
            .sections()?
            .section(isa)
            .map(|section| section.values().cloned().collect())
            .unwrap_or_default();
        for object in candidates {
            if self.resolve_element(&object)?.url.as_deref() == Some(want.as_path()) {
                return Ok(Some(object));
            }
        }
        Ok(None)
    }

    /// Create a `PBXBuildFile` for `file_ref`, wired into `phase`'s `files`.
    pub fn add_build_file(
        &mut self,
        phase: &Ptr<PbxObject>,
        file_ref: &Ptr<PbxObject>,
    ) -> PbxResult<Ptr<PbxObject>> {
        let build_file = self.create_object("PBXBuildFile")?;
        let lit = reference_from(&build_file, file_ref)?;
        build_file
            .write()?
            .content
            .insert(Literal::from("fileRef"), Value::Literal(lit));
        let lit = reference_from(phase, &build_file)?;
        let pushed = phase
            .write()?
            .content
            .entry(Literal::from("files"))
            .or_insert_with(|| Value::Array(Vec::new()))
            .push(Value::Literal(lit));
        if !pushed {
            return Err(PbxError::Structure(
                "build phase `files` is not an array".to_string(),
            ));
        }
        Ok(build_file)
    }
    /// Register `child` in `group`'s `children` array, with the reference hooks applied.
    fn attach_child(&self, group: &Ptr<PbxObject>, child: &Ptr<PbxObject>) -> PbxResult<()> {
        let lit = reference_from(group, child)?;
        let pushed = group
            .write()?
            .content
            .entry(Literal::from("children"))
            .or_insert_with(|| Value::Array(Vec::new()))
            .push(Value::Literal(lit));
        if !pushed {
            return Err(PbxError::Structure(
                "group `children` is not an array".to_string(),
            ));
        }
        Ok(())
    }

    /// Enumerate the child projects referenced through the root object's
    /// `projectReferences`. The callback returns whether to continue; with
    /// [EnumerateOptions::deep] children recurse, and with
    /// [EnumerateOptions::once] each project loads at most once per
    /// enumeration, deduplicated by canonical URL.
    pub fn child_projects(
        &self,
        options: EnumerateOptions,
        callback: &mut dyn FnMut(&PbxProject) -> bool,
    ) -> PbxResult<()> {
        let mut visited = HashSet::new();
        if options.once {
            visited.insert(canonicalize(&self.bundle));
        }
        self.walk_child_projects(options, callback, &mut visited)?;
        Ok(())
    }
    fn walk_child_projects(
        &self,
        options: EnumerateOptions,
        callback: &mut dyn FnMut(&PbxProject) -> bool,
        visited: &mut HashSet<PathBuf>,
    ) -> PbxResult<bool> {
        let root = self.root_object()?;
        let mut project_refs = Vec::new();
        {
            let obj = root.read()?;
            if let Some(entries) = obj.content.get("projectReferences").and_then(Value::as_array) {
                for entry in entries {
                    let file_ref = entry
                        .as_dict()
                        .and_then(|d| d.get("ProjectRef"))
                        .and_then(Value::as_literal)
                        .and_then(Literal::target);
                    if let Some(file_ref) = file_ref {
                        project_refs.push(file_ref);
                    }
                }
            }
        }
        for file_ref in project_refs {
            let url = match self.resolve_file_reference_path(&file_ref)?.url {
                Some(url) => url,
                None => continue,
            };
            if options.once && !visited.insert(url.clone()) {
                continue;
            }
            let child = PbxProject::open(&url)?;
            if !callback(&child) {
                return Ok(false);
            }
            if options.deep && !child.walk_child_projects(options, callback, visited)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Link `referrer` to `target`: registers the back-edge (with the kind hooks
/// applied) and returns the non-silent reference literal to embed.
pub fn reference_from(
    referrer: &Ptr<PbxObject>,
    target: &Ptr<PbxObject>,
) -> PbxResult<Literal> {
    let id = target.read()?.id().to_string();
    let referrer_kind = referrer.read()?.kind();
    target.write()?.add_reference(referrer, referrer_kind);
    Ok(Literal::reference(id, target))
}

/// Strip every occurrence of `id` from `dict`: matching dictionary keys,
/// matching literal values (the whole entry goes), and matching array
/// elements. Positions are collected before any mutation.
fn strip_occurrences(dict: &mut Dict, id: &str) {
    let mut doomed: Vec<Literal> = Vec::new();
    for (key, value) in dict.iter_mut() {
        if key.text() == id {
            doomed.push(key.clone());
            continue;
        }
        match value {
            Value::Literal(lit) if lit.text() == id => doomed.push(key.clone()),
            Value::Dict(nested) => strip_occurrences(nested, id),
            Value::Array(array) => strip_array(array, id),
            _ => {}
        }
    }
    for key in doomed {
        dict.shift_remove(&key);
    }
}
fn strip_array(array: &mut Vec<Value>, id: &str) {
    array.retain_mut(|value| match value {
        Value::Literal(lit) => lit.text() != id,
        Value::Dict(nested) => {
            strip_occurrences(nested, id);
            true
        }
        Value::Array(nested) => {
            strip_array(nested, id);
            true
        }
        _ => true,
    });
}

/// Collect the live targets of every reference embedded in `dict`.
fn collect_targets(dict: &Dict, out: &mut Vec<Ptr<PbxObject>>) {
    for (key, value) in dict {
        if let Some(target) = key.target() {
            out.push(target);
        }
        collect_value_targets(value, out);
    }
}
fn collect_value_targets(value: &Value, out: &mut Vec<Ptr<PbxObject>>) {
    match value {
        Value::Literal(lit) => {
            if let Some(target) = lit.target() {
                out.push(target);
            }
        }
        Value::Dict(dict) => collect_targets(dict, out),
        Value::Array(array) => {
            for v in array {
                collect_value_targets(v, out);
            }
        }
        _ => {}
    }
}

/// Extension to `lastKnownFileType` UTI table, for created file references.
static FILE_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("a", "archive.ar");
    m.insert("app", "wrapper.application");
    m.insert("c", "sourcecode.c.c");
    m.insert("cc", "sourcecode.cpp.cpp");
    m.insert("cpp", "sourcecode.cpp.cpp");
    m.insert("dylib", "compiled.mach-o.dylib");
    m.insert("entitlements", "text.plist.entitlements");
    m.insert("framework", "wrapper.framework");
    m.insert("h", "sourcecode.c.h");
    m.insert("hpp", "sourcecode.cpp.h");
    m.insert("html", "text.html");
    m.insert("json", "text.json");
    m.insert("m", "sourcecode.c.objc");
    m.insert("md", "net.daringfireball.markdown");
    m.insert("mm", "sourcecode.cpp.objcpp");
    m.insert("modulemap", "sourcecode.module");
    m.insert("pch", "sourcecode.c.h");
    m.insert("plist", "text.plist.xml");
    m.insert("png", "image.png");
    m.insert("sh", "text.script.sh");
    m.insert("storyboard", "file.storyboard");
    m.insert("strings", "text.plist.strings");
    m.insert("swift", "sourcecode.swift");
    m.insert("tbd", "sourcecode.text-based-dylib-definition");
    m.insert("xcassets", "folder.assetcatalog");
    m.insert("xcconfig", "text.xcconfig");
    m.insert("xcodeproj", "wrapper.pb-project");
    m.insert("xib", "file.xib");
    m.insert("xml", "text.xml");
    m
});

/// Look up the `lastKnownFileType` for a file extension.
pub fn file_type_for_extension(ext: &str) -> Option<&'static str> {
    FILE_TYPES.get(ext).copied()
}
