use super::*;
use crate::utils::SerializationFormat::Yaml;
use std::path::{Path, PathBuf};

/// Helper function: a workspace parsed from `src`, anchored at `/w`.
fn demo_workspace(src: &str) -> XcwResult<Workspace> {
    Workspace::from_source(src, "/w/Demo.xcworkspace/contents.xcworkspacedata")
}

#[test]
fn it_resolves_nested_locations() -> XcwResult<()> {
    // Scenario S4: a group-relative FileRef inside a container-anchored Group
    let src = r#"<?xml version="1.0" encoding="UTF-8"?>
<Workspace version = "1.0">
   <Group location = "container:sub" name = "Sub">
      <FileRef location = "group:a/b.xcodeproj"/>
   </Group>
</Workspace>
"#;
    let mut workspace = demo_workspace(src)?;
    let refs = workspace.references()?;
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].url, PathBuf::from("/w/sub/a/b.xcodeproj"));
    assert_eq!(refs[0].location, "group:a/b.xcodeproj");
    Ok(())
}

#[test]
fn it_round_trips_exact_bytes() -> XcwResult<()> {
    let src = r#"<?xml version="1.0" encoding="UTF-8"?>
<Workspace version = "1.0">
   <FileRef location = "group:App.xcodeproj"/>
   <Group location = "container:Libs" name = "Libs">
      <FileRef location = "group:Core/Core.xcodeproj"/>
   </Group>
</Workspace>
"#;
    let workspace = demo_workspace(src)?;
    assert_eq!(workspace.content(), src);
    Ok(())
}

#[test]
fn it_resolves_each_prefix() -> XcwResult<()> {
    let src = r#"<?xml version="1.0" encoding="UTF-8"?>
<Workspace version = "1.0">
   <FileRef location = "group:A.xcodeproj"/>
   <FileRef location = "container:deeper/B.xcodeproj"/>
   <FileRef location = "absolute:/opt/C.xcodeproj"/>
   <FileRef location = "group:not-a-project.txt"/>
</Workspace>
"#;
    let mut workspace = demo_workspace(src)?;
    let urls: Vec<&Path> = workspace
        .references()?
        .iter()
        .map(|r| r.url.as_path())
        .collect();
    // Non-`.xcodeproj` FileRefs are not project references
    assert_eq!(
        urls,
        vec![
            Path::new("/w/A.xcodeproj"),
            Path::new("/w/deeper/B.xcodeproj"),
            Path::new("/opt/C.xcodeproj"),
        ]
    );
    Ok(())
}

#[test]
fn it_appends_inserts_and_removes_references() -> XcwResult<()> {
    let mut workspace = Workspace::new("/w/Demo.xcworkspace/contents.xcworkspacedata");
    workspace.append_reference(Path::new("/w/App.xcodeproj"), false)?;
    workspace.append_reference(Path::new("/opt/Tool.xcodeproj"), true)?;
    // Documented insertion-at-index behavior
    workspace.insert_reference(Path::new("/w/First.xcodeproj"), false, 0)?;

    let locations: Vec<String> = workspace
        .references()?
        .iter()
        .map(|r| r.location.clone())
        .collect();
    assert_eq!(
        locations,
        vec![
            "group:First.xcodeproj".to_string(),
            "group:App.xcodeproj".to_string(),
            "absolute:/opt/Tool.xcodeproj".to_string(),
        ]
    );

    // Removal by URL detaches the backing node and evicts the cache entry
    assert!(workspace.remove_reference(Path::new("/w/App.xcodeproj"))?);
    assert!(!workspace.remove_reference(Path::new("/w/App.xcodeproj"))?);
    assert_eq!(workspace.references()?.len(), 2);
    assert!(!workspace.content().contains("App.xcodeproj"));

    // Removal by reference
    let first = workspace.references()?[0].clone();
    workspace.remove(&first)?;
    assert_eq!(workspace.references()?.len(), 1);
    Ok(())
}

#[test]
fn it_rebuilds_the_cache_after_mutation() -> XcwResult<()> {
    let mut workspace = Workspace::new("/w/Demo.xcworkspace/contents.xcworkspacedata");
    workspace.append_reference(Path::new("/w/A.xcodeproj"), false)?;
    assert_eq!(workspace.references()?.len(), 1);
    workspace.append_reference(Path::new("/w/B.xcodeproj"), false)?;
    // The earlier borrow was invalidated by the mutation; a fresh call sees both
    assert_eq!(workspace.references()?.len(), 2);
    Ok(())
}

#[test]
fn it_escapes_attribute_values() -> XcwResult<()> {
    let mut workspace = Workspace::new("/w/Demo.xcworkspace/contents.xcworkspacedata");
    let mut node = XmlElement::new("Group");
    node.set_attribute("name", "A & B <π> \"q\"");
    node.set_attribute("location", "container:x");
    workspace_root_mut(&mut workspace).children.push(node);
    let rendered = workspace.content();
    assert!(rendered.contains("name = \"A &amp; B &lt;&#x03C0;&gt; &quot;q&quot;\""));
    // Reparsing decodes the entities back to the original value
    let reparsed = demo_workspace(&rendered)?;
    assert_eq!(
        reparsed.root().children[0].attribute("name"),
        Some("A & B <π> \"q\"")
    );
    Ok(())
}

#[test]
fn it_rejects_malformed_xml() {
    assert!(demo_workspace("<Workspace").is_err());
    assert!(demo_workspace("<Workspace></Mismatch>").is_err());
    assert!(demo_workspace("<Workspace version = ></Workspace>").is_err());
}

#[test]
fn it_serializes_reference_summaries() -> XcwResult<()> {
    let mut workspace = Workspace::new("/w/Demo.xcworkspace/contents.xcworkspacedata");
    workspace.append_reference(Path::new("/w/App.xcodeproj"), false)?;
    let refs: Vec<ProjectReference> = workspace.references()?.to_vec();
    let yaml = Yaml.to_string(&refs)?;
    let back: Vec<ProjectReference> = Yaml.from_str(&yaml)?;
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].url, refs[0].url);
    assert_eq!(back[0].location, refs[0].location);
    Ok(())
}

/// Helper function: mutable access to the root element for test setup.
/// Mutations through this handle must invalidate the cache themselves; the
/// tests only render afterwards.
fn workspace_root_mut(workspace: &mut Workspace) -> &mut XmlElement {
    // Rebuild through the public API: detach and re-grow is overkill for test
    // setup, so reach through the crate-internal field instead.
    &mut workspace.root
}
