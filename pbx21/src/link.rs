//!
//! # Reference-Linking Module
//!
//! Second pass over a freshly parsed root dictionary: builds the objects of
//! the flat `objects` map, rewrites every embedded identifier string into a
//! reference [Literal], registers weak back-edges, and buckets the objects
//! into [Sections] by their `isa` tag.
//!
//! The pass runs in two phases so no object lock is ever re-entered: first
//! every dictionary is rewritten (collecting the back-edges to register),
//! then the back-edges are applied.
//!

// Crates.io Imports
use tracing::trace;

// Xcode21 Imports
use crate::utils::{OrderedMap, Ptr};

// Local imports
use super::data::*;

/// Flat identifier-to-object map, alive only while linking.
type ObjectMap = OrderedMap<String, Ptr<PbxObject>>;

/// Pending back-edge registrations: `(target, referrer)` pairs.
type BackRefs = Vec<(Ptr<PbxObject>, Ptr<PbxObject>)>;

/// Link the parsed root dictionary in place.
/// `project_name` seeds the display name of the root `PBXProject` record.
pub(crate) fn link_root(root: &mut Dict, project_name: &str) -> PbxResult<()> {
    // Pull the flat `objects` dictionary out of the root
    let objects_value = match root.get_mut("objects") {
        Some(value) => value,
        None => {
            return Err(PbxError::Structure(
                "missing `objects` dictionary".to_string(),
            ))
        }
    };
    let raw = match std::mem::replace(objects_value, Value::Sections(Sections::new())) {
        Value::Dict(dict) => dict,
        other => {
            *objects_value = other;
            return Err(PbxError::Structure(
                "`objects` is not a dictionary".to_string(),
            ));
        }
    };

    // Build each record through the object factory
    let mut objects = ObjectMap::with_capacity(raw.len());
    for (key, value) in raw {
        if key.is_reference() {
            return Err(PbxError::Structure(
                "non-string key in `objects`".to_string(),
            ));
        }
        let content = match value {
            Value::Dict(dict) => dict,
            _ => {
                return Err(PbxError::Structure(format!(
                    "non-dictionary entry `{}` in `objects`",
                    key.text()
                )))
            }
        };
        let object = PbxObject::create(key.text(), content)?;
        objects.insert(key.text().to_string(), Ptr::new(object));
    }

    // The root project record carries the project name for comment rendering
    for ptr in objects.values() {
        if ptr.read()?.kind() == ObjectKind::Project {
            ptr.write()?.set_name_hint(project_name);
        }
    }

    // Phase one: rewrite identifier strings into reference literals
    let mut backrefs = BackRefs::new();
    for ptr in objects.values() {
        let content = std::mem::take(&mut ptr.write()?.content);
        let linked = link_dict(content, &objects, Some(ptr), &mut backrefs);
        ptr.write()?.content = linked;
    }
    let taken = std::mem::take(root);
    *root = link_dict(taken, &objects, None, &mut backrefs);

    // Phase two: apply the collected back-edges
    let count = backrefs.len();
    for (target, referrer) in backrefs {
        let referrer_kind = referrer.read()?.kind();
        target.write()?.add_reference(&referrer, referrer_kind);
    }

    // Re-bucket into sections, preserving insertion order within each
    let mut sections = Sections::new();
    for ptr in objects.values() {
        sections.insert(ptr.clone())?;
    }
    trace!(
        "linked {} objects into {} sections, {} references",
        sections.len(),
        sections.iter().count(),
        count
    );
    match root.get_mut("objects") {
        Some(value) => *value = Value::Sections(sections),
        None => {
            return Err(PbxError::Structure(
                "`objects` missing after link".to_string(),
            ))
        }
    }
    Ok(())
}

/// Rewrite one dictionary. Keys naming an object become reference literals,
/// silent when their value is itself a dictionary; values are rewritten
/// recursively, silently under a `remoteGlobalIDString` key.
fn link_dict(
    dict: Dict,
    objects: &ObjectMap,
    containing: Option<&Ptr<PbxObject>>,
    backrefs: &mut BackRefs,
) -> Dict {
    let mut out = Dict::with_capacity(dict.len());
    for (key, value) in dict {
        let key = match objects.get(key.text()) {
            Some(target) if !key.is_reference() => {
                register(backrefs, target, containing);
                Literal::reference_with_silence(key.text(), target, matches!(value, Value::Dict(_)))
            }
            _ => key,
        };
        let silent = key.text() == "remoteGlobalIDString";
        let value = link_value(value, objects, containing, silent, backrefs);
        out.insert(key, value);
    }
    out
}

/// Rewrite one value. Literal ref-candidates resolve against the objects map;
/// containers recurse, array elements inheriting the caller's silent flag.
fn link_value(
    value: Value,
    objects: &ObjectMap,
    containing: Option<&Ptr<PbxObject>>,
    silent: bool,
    backrefs: &mut BackRefs,
) -> Value {
    match value {
        Value::Literal(Literal::Str(s)) => match objects.get(s.as_str()) {
            Some(target) => {
                register(backrefs, target, containing);
                Value::Literal(Literal::reference_with_silence(s, target, silent))
            }
            None => Value::Literal(Literal::Str(s)),
        },
        Value::Literal(other) => Value::Literal(other),
        Value::Dict(dict) => Value::Dict(link_dict(dict, objects, containing, backrefs)),
        Value::Array(array) => Value::Array(
            array
                .into_iter()
                .map(|v| link_value(v, objects, containing, silent, backrefs))
                .collect(),
        ),
        // Objects and sections only exist post-link; pass them through
        passthrough @ (Value::Object(_) | Value::Sections(_)) => passthrough,
    }
}

/// Queue a back-edge from `containing` onto `target`, if there is a containing object.
fn register(backrefs: &mut BackRefs, target: &Ptr<PbxObject>, containing: Option<&Ptr<PbxObject>>) {
    if let Some(containing) = containing {
        backrefs.push((target.clone(), containing.clone()));
    }
}
