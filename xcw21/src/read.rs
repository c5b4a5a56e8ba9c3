//!
//! # Workspace Reading Module
//!
//! XML parsing into the owned element tree, and the recursive descent that
//! resolves `location` attributes into project references.
//!

// Std-Lib
use std::path::{Path, PathBuf};

// Crates.io Imports
use serde::{Deserialize, Serialize};

// Xcode21 Imports
use crate::utils::{canonicalize, enumstr, EnumStr};

// Local imports
use super::data::*;

/// Parse workspace XML `src` into an owned [XmlElement] tree.
/// External entities are never loaded.
pub(crate) fn parse_str(src: &str) -> XcwResult<XmlElement> {
    let doc = roxmltree::Document::parse(src)?;
    Ok(convert(doc.root_element()))
}

/// Convert one parsed node, recursively. Only element nodes are retained.
fn convert(node: roxmltree::Node) -> XmlElement {
    let mut element = XmlElement::new(node.tag_name().name());
    for attr in node.attributes() {
        element
            .attributes
            .push((attr.name().to_string(), attr.value().to_string()));
    }
    for child in node.children().filter(|c| c.is_element()) {
        element.children.push(convert(child));
    }
    element
}

enumstr!(
    /// # Location Prefixes
    ///
    /// The anchor of a workspace `location` attribute, written as
    /// `<prefix>:<path>`.
    LocationPrefix {
        Group: "group",
        Container: "container",
        Absolute: "absolute",
    }
);

/// Collect the project references of the tree rooted at `root`.
///
/// For each child carrying a `location` attribute the prefix is stripped,
/// the location path and absolute URL are computed, and `FileRef` nodes
/// whose URL ends in `.xcodeproj` are emitted. `Group` nodes recurse with
/// their own location and directory as the new anchors.
pub(crate) fn collect_references(root: &XmlElement, workspace_dir: &Path) -> Vec<ProjectReference> {
    let mut refs = Vec::new();
    let mut trail = Vec::new();
    descend(
        root,
        workspace_dir,
        Path::new(""),
        workspace_dir,
        &mut trail,
        &mut refs,
    );
    refs
}

fn descend(
    element: &XmlElement,
    workspace_dir: &Path,
    parent_location: &Path,
    parent_dir: &Path,
    trail: &mut Vec<usize>,
    refs: &mut Vec<ProjectReference>,
) {
    for (index, child) in element.children.iter().enumerate() {
        let location = match child.attribute("location") {
            Some(location) => location,
            None => continue,
        };
        let (prefix, rest) = match location.split_once(':') {
            Some((name, rest)) => match LocationPrefix::from_str(name) {
                Some(prefix) => (prefix, rest),
                None => continue,
            },
            None => continue,
        };
        let (child_location, child_url) = match prefix {
            LocationPrefix::Group => (parent_location.join(rest), parent_dir.join(rest)),
            LocationPrefix::Container => (PathBuf::from(rest), workspace_dir.join(rest)),
            LocationPrefix::Absolute => (PathBuf::from(rest), PathBuf::from(rest)),
        };
        trail.push(index);
        match child.name.as_str() {
            "FileRef" => {
                if child_url.extension().map(|e| e == "xcodeproj").unwrap_or(false) {
                    refs.push(ProjectReference {
                        url: canonicalize(&child_url),
                        location: location.to_string(),
                        node: trail.clone(),
                    });
                }
            }
            "Group" => {
                descend(child, workspace_dir, &child_location, &child_url, trail, refs);
            }
            _ => {}
        }
        trail.pop();
    }
}
