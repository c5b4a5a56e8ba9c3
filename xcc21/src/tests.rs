use super::*;
use crate::utils::SerializationFormat::Yaml;
use crate::utils::Ptr;
use std::path::PathBuf;

/// Helper function: a scratch directory unique to test `name`.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("xcc21-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Helper function: the values at `(key, config, sdk, arch)` as owned strings.
fn lookup(cfg: &Ptr<Configuration>, key: &str, config: &str, sdk: &str, arch: &str) -> Option<Vec<String>> {
    cfg.read()
        .unwrap()
        .value_for_key(key, config, sdk, arch)
        .map(|values| values.to_vec())
}

#[test]
fn it_parses_conditional_settings() -> XccResult<()> {
    // Scenario S5
    let src = "K[sdk=iphoneos] = \"v 1\" v2 // c\n";
    let cfg = Configuration::from_source(src, "/c/a.xcconfig")?;
    {
        let cfg = cfg.read()?;
        let setting = match &cfg.lines()[0] {
            Line::Setting(setting) => setting.clone(),
            other => panic!("expected a setting line, got {:?}", other),
        };
        assert_eq!(setting.key, "K");
        assert_eq!(setting.conditionals.get(ConditionalName::Sdk), "iphoneos");
        assert_eq!(setting.conditionals.get(ConditionalName::Config), "*");
        assert_eq!(setting.conditionals.get(ConditionalName::Arch), "*");
        assert_eq!(setting.values, vec!["v 1".to_string(), "v2".to_string()]);
        assert_eq!(setting.comment.as_deref(), Some("c"));
        assert_eq!(cfg.content(), src);
    }
    // The conditional coordinates index the tree
    assert_eq!(
        lookup(&cfg, "K", "*", "iphoneos", "*"),
        Some(vec!["v 1".to_string(), "v2".to_string()])
    );
    // Literal coordinates: `*` does not wildcard into the sdk entry
    assert_eq!(lookup(&cfg, "K", "*", "*", "*"), None);
    Ok(())
}

#[test]
fn it_round_trips_lines() -> XccResult<()> {
    let src = "// header\n\n#include? \"Other.xcconfig\"\nKEY = value\nEMPTY =\nQUOTED = \"a b\" \"\"\nK[config=Debug][arch=arm64] = $(SRCROOT)/lib // tail\n";
    let cfg = Configuration::from_source(src, "/c/a.xcconfig")?;
    assert_eq!(cfg.read()?.content(), src);
    Ok(())
}

#[test]
fn it_normalizes_comment_spacing() -> XccResult<()> {
    let cfg = Configuration::from_source("//x\n//  y\nK = v //end\n", "/c/a.xcconfig")?;
    assert_eq!(cfg.read()?.content(), "// x\n//  y\nK = v // end\n");
    Ok(())
}

#[test]
fn it_preserves_empty_quoted_values() -> XccResult<()> {
    let cfg = Configuration::from_source("K = \"\" b\n", "/c/a.xcconfig")?;
    assert_eq!(
        lookup(&cfg, "K", "*", "*", "*"),
        Some(vec![String::new(), "b".to_string()])
    );
    assert_eq!(cfg.read()?.content(), "K = \"\" b\n");
    Ok(())
}

#[test]
fn it_rejects_malformed_lines() {
    // Invalid conditional name
    assert!(read_err("K[os=x] = v"));
    // Missing `]`
    assert!(read_err("K[sdk=ios = v"));
    // Missing `=` in a conditional
    assert!(read_err("K[sdk] = v"));
    // Missing `=` in the assignment
    assert!(read_err("K v"));
    // Missing key
    assert!(read_err("= v"));
    // Unterminated quoted value
    assert!(read_err("K = \"unterminated"));
    // Dangling escape
    assert!(read_err("K = \"dangling\\"));
    // Unknown escape
    assert!(read_err("K = \"bad\\q\""));
    // Include without quotes
    assert!(read_err("#include Other.xcconfig"));
    // Unexpected characters after an include
    assert!(read_err("#include \"x.xcconfig\" trailing"));

    // Errors carry their line number
    match Configuration::from_source("A = 1\nB[zz=1] = 2\n", "/c/a.xcconfig") {
        Err(XccError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

fn read_err(src: &str) -> bool {
    Configuration::from_source(src, "/c/a.xcconfig").is_err()
}

#[test]
fn it_overlays_includes_in_line_order() -> XccResult<()> {
    // Scenario S6
    let dir = scratch_dir("overlay");
    std::fs::write(dir.join("B.xcconfig"), "K = b\nL = b\n")?;
    std::fs::write(dir.join("A.xcconfig"), "#include \"B.xcconfig\"\nK = a\n")?;
    let a = Configuration::open(dir.join("A.xcconfig"), true)?;

    // The including file wins where both define a key (property 9)
    assert_eq!(lookup(&a, "K", "*", "*", "*"), Some(vec!["a".to_string()]));
    assert_eq!(lookup(&a, "L", "*", "*", "*"), Some(vec!["b".to_string()]));

    // The surviving included entry still names its defining file
    let b = a.read()?.included().into_iter().next().unwrap();
    {
        let guard = a.read()?;
        let content = guard.content_for_key("L", "*", "*", "*").unwrap();
        assert!(content.source.ptr_eq(&b));
    }

    // Appending re-derives the tree: the new assignment takes over
    Configuration::append_line(
        &a,
        Line::Setting(Setting {
            key: "L".to_string(),
            values: vec!["a2".to_string()],
            ..Default::default()
        }),
    )?;
    assert_eq!(lookup(&a, "L", "*", "*", "*"), Some(vec!["a2".to_string()]));
    Ok(())
}

#[test]
fn it_propagates_downstream_rebuilds() -> XccResult<()> {
    // Property 11
    let dir = scratch_dir("downstream");
    std::fs::write(dir.join("B.xcconfig"), "K = b\n")?;
    std::fs::write(dir.join("A.xcconfig"), "#include \"B.xcconfig\"\n")?;
    let a = Configuration::open(dir.join("A.xcconfig"), true)?;
    let b = a.read()?.included().into_iter().next().unwrap();
    assert_eq!(b.read()?.downstream(), vec![a.clone()]);

    Configuration::append_line(
        &b,
        Line::Setting(Setting {
            key: "M".to_string(),
            values: vec!["x".to_string()],
            ..Default::default()
        }),
    )?;
    // The downstream file re-derived its tree and sees the new key
    assert_eq!(lookup(&a, "M", "*", "*", "*"), Some(vec!["x".to_string()]));
    Ok(())
}

#[test]
fn it_survives_include_cycles() -> XccResult<()> {
    // Property 10: a cyclic graph loads, each file parsed once
    let dir = scratch_dir("cycle");
    std::fs::write(dir.join("A.xcconfig"), "#include \"B.xcconfig\"\nKA = a\n")?;
    std::fs::write(dir.join("B.xcconfig"), "#include \"A.xcconfig\"\nKB = b\n")?;
    let a = Configuration::open(dir.join("A.xcconfig"), true)?;
    assert_eq!(a.read()?.included().len(), 1);
    assert_eq!(lookup(&a, "KA", "*", "*", "*"), Some(vec!["a".to_string()]));
    assert_eq!(lookup(&a, "KB", "*", "*", "*"), Some(vec!["b".to_string()]));
    Ok(())
}

#[test]
fn it_loads_diamond_includes_once() -> XccResult<()> {
    let dir = scratch_dir("diamond");
    std::fs::write(dir.join("D.xcconfig"), "K = d\n")?;
    std::fs::write(dir.join("B.xcconfig"), "#include \"D.xcconfig\"\n")?;
    std::fs::write(dir.join("C.xcconfig"), "#include \"D.xcconfig\"\n")?;
    std::fs::write(
        dir.join("A.xcconfig"),
        "#include \"B.xcconfig\"\n#include \"C.xcconfig\"\n",
    )?;
    let a = Configuration::open(dir.join("A.xcconfig"), true)?;
    // B, C, and one shared D
    assert_eq!(a.read()?.included().len(), 3);
    assert_eq!(lookup(&a, "K", "*", "*", "*"), Some(vec!["d".to_string()]));
    Ok(())
}

#[test]
fn it_degrades_optional_includes() -> XccResult<()> {
    let dir = scratch_dir("optional");
    std::fs::write(
        dir.join("A.xcconfig"),
        "#include? \"missing.xcconfig\"\nK = a\n",
    )?;
    let a = Configuration::open(dir.join("A.xcconfig"), true)?;
    {
        let guard = a.read()?;
        let include = match &guard.lines()[0] {
            Line::Include(include) => include.clone(),
            other => panic!("expected an include line, got {:?}", other),
        };
        // The line is preserved, resolved but not loaded
        assert!(include.optional);
        assert!(include.resolved.is_some());
        assert!(include.loaded.is_none());
    }
    assert_eq!(lookup(&a, "K", "*", "*", "*"), Some(vec!["a".to_string()]));

    // A required include that fails to load propagates the error
    std::fs::write(dir.join("B.xcconfig"), "#include \"missing.xcconfig\"\n")?;
    assert!(Configuration::open(dir.join("B.xcconfig"), true).is_err());
    Ok(())
}

#[test]
fn it_removes_lines_and_rebuilds() -> XccResult<()> {
    let cfg = Configuration::from_source("K = a\nK = b\n", "/c/a.xcconfig")?;
    assert_eq!(lookup(&cfg, "K", "*", "*", "*"), Some(vec!["b".to_string()]));
    let removed = Configuration::remove_line(&cfg, 1)?;
    assert!(matches!(removed, Line::Setting(_)));
    assert_eq!(lookup(&cfg, "K", "*", "*", "*"), Some(vec!["a".to_string()]));
    assert!(Configuration::remove_line(&cfg, 5).is_err());
    Ok(())
}

#[test]
fn it_removes_tree_values_with_cascade() -> XccResult<()> {
    let cfg = Configuration::from_source("K[sdk=iphoneos] = v\n", "/c/a.xcconfig")?;
    assert!(cfg.write()?.remove_value("K", "*", "iphoneos", "*").is_some());
    assert_eq!(lookup(&cfg, "K", "*", "iphoneos", "*"), None);
    assert!(cfg.write()?.remove_value("K", "*", "iphoneos", "*").is_none());
    Ok(())
}

#[test]
fn it_writes_atomically() -> XccResult<()> {
    let dir = scratch_dir("write");
    let cfg = Configuration::from_source("K = v\n", dir.join("a.xcconfig"))?;
    cfg.read()?.write(None)?;
    assert_eq!(std::fs::read_to_string(dir.join("a.xcconfig"))?, "K = v\n");
    Ok(())
}

#[test]
fn it_serializes_line_lists() -> XccResult<()> {
    let cfg = Configuration::from_source(
        "// header\n#include \"B.xcconfig\"\nK[arch=arm64] = a b\n",
        "/c/a.xcconfig",
    )?;
    let lines = cfg.read()?.lines().to_vec();
    let yaml = Yaml.to_string(&lines)?;
    let back: Vec<Line> = Yaml.from_str(&yaml)?;
    assert_eq!(back, lines);
    Ok(())
}
