// Integration tests for classmap

use assert_cmd::Command;
use classmap::{
    extract_declarations, generate, Analyzer, Config, DiagramMode, Direction, SkipReason,
};
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn classmap() -> Command {
    Command::cargo_bin("classmap").expect("binary should build")
}

fn zoo_config(mode: DiagramMode) -> Config {
    let mut config = Config::default();
    config.diagram.mode = mode;
    config.analysis.exclude.push("legacy/*".to_string());
    config
}

// ============================================================================
// Extraction Tests
// ============================================================================

#[test]
fn test_extract_zoo_project() {
    let result = extract_declarations(&fixtures_path("zoo"), &Config::default())
        .expect("Analysis failed");

    let paths: Vec<&str> = result.model.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "animals.py",
            "broken.py",
            "helpers.py",
            "keeper.py",
            "legacy/old.py",
            "plugin.py"
        ]
    );
    // build/ is pruned by default
    assert!(result.model.get("build/generated.py").is_none());
    assert_eq!(result.files_scanned, 6);
    assert_eq!(result.project_name, "zoo");

    let animals = result.model.get("animals.py").unwrap();
    let imports: Vec<&str> = animals.imports.iter().map(String::as_str).collect();
    assert_eq!(imports, vec!["os", "typing"]);
    assert_eq!(
        animals.inheritance,
        vec![("Dog".to_string(), vec!["Animal".to_string()])]
    );

    let keeper = result.model.get("keeper.py").unwrap();
    assert!(keeper.imports.contains("animals"));
}

#[test]
fn test_broken_file_is_reported_not_fatal() {
    let result = extract_declarations(&fixtures_path("zoo"), &Config::default()).unwrap();

    assert_eq!(result.skipped.len(), 1);
    assert!(matches!(
        result.skipped.get("broken.py"),
        Some(SkipReason::Unparsable(_))
    ));
    assert!(result.model.get("broken.py").unwrap().is_empty());
}

#[test]
fn test_dynamic_base_is_dropped() {
    let result = extract_declarations(&fixtures_path("zoo"), &Config::default()).unwrap();
    let plugin = result.model.get("plugin.py").unwrap();
    assert_eq!(plugin.classes[0].name, "Plugin");
    assert!(plugin.classes[0].bases.is_empty());
    assert!(plugin.inheritance.is_empty());
}

#[test]
fn test_sequential_matches_parallel() {
    let mut config = Config::default();
    let parallel = Analyzer::new(&config)
        .unwrap()
        .analyze(&fixtures_path("zoo"))
        .unwrap();
    config.analysis.parallel = false;
    let sequential = Analyzer::new(&config)
        .unwrap()
        .analyze(&fixtures_path("zoo"))
        .unwrap();

    assert_eq!(parallel.model, sequential.model);
    assert_eq!(parallel.skipped, sequential.skipped);
}

#[test]
fn test_nonexistent_path() {
    let result = extract_declarations(&PathBuf::from("/nonexistent/zoo"), &Config::default());
    assert!(result.is_err());
}

#[test]
fn test_empty_directory_gives_placeholder() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("__init__.py"), "").unwrap();

    let config = Config::default();
    let result = extract_declarations(dir.path(), &config).unwrap();
    assert_eq!(result.skipped.get("__init__.py"), Some(&SkipReason::Empty));

    let text = generate(&result.model, &config, &result.project_name).unwrap();
    assert_eq!(text, "classDiagram\n    class Empty");
}

// ============================================================================
// Diagram Tests
// ============================================================================

#[test]
fn test_structure_diagram() {
    let config = zoo_config(DiagramMode::Structure);
    let result = extract_declarations(&fixtures_path("zoo"), &config).unwrap();
    let text = generate(&result.model, &config, &result.project_name).unwrap();

    let expected = "\
classDiagram
class Animal {
    +kingdom
    -__init__(name: str)
    +speak() str
}
class Dog {
    +speak() str
    +fetch(*items, **options)
}
class Keeper {
    -__init__()
    +feed(animal)
}
class Ledger {
}
class Plugin {
}
class _helper {
    +function(x)
}
class make_base {
    +function()
}
Animal <|-- Dog
animals ..> os : imports
animals ..> typing : imports
keeper ..> animals : imports";
    assert_eq!(text, expected);
}

#[test]
fn test_call_graph_diagram() {
    let config = zoo_config(DiagramMode::CallGraph);
    let result = extract_declarations(&fixtures_path("zoo"), &config).unwrap();
    let text = generate(&result.model, &config, &result.project_name).unwrap();

    let expected = "\
classDiagram
direction TD
class Animal {
    -_age
    +name
    -__init__(name: str)
    +speak() str
}
class Dog {
    +speak() str
    +fetch(*items, **options)
}
class Keeper {
    +dogs
    -__init__()
    +feed(animal)
}
class Ledger {
}
class Plugin {
}
Animal <|-- Dog
Dog : speak() --> Animal : speak()
Dog : fetch() --> Keeper : feed()
zoo <.. Ledger
zoo <.. Plugin
class zoo";
    assert_eq!(text, expected);
}

#[test]
fn test_diagram_is_deterministic() {
    for mode in [DiagramMode::Structure, DiagramMode::CallGraph] {
        let config = zoo_config(mode);
        let first = extract_declarations(&fixtures_path("zoo"), &config).unwrap();
        let second = extract_declarations(&fixtures_path("zoo"), &config).unwrap();
        assert_eq!(
            generate(&first.model, &config, "zoo").unwrap(),
            generate(&second.model, &config, "zoo").unwrap()
        );
    }
}

#[test]
fn test_direction_and_project_name_from_config() {
    let mut config = zoo_config(DiagramMode::CallGraph);
    config.diagram.direction = Some(Direction::Lr);
    config.project.name = Some("city zoo".to_string());
    let result = extract_declarations(&fixtures_path("zoo"), &config).unwrap();
    let text = generate(&result.model, &config, &result.project_name).unwrap();

    assert!(text.starts_with("classDiagram\ndirection LR\n"));
    assert!(text.contains("city_zoo <.. Ledger"));
    assert!(text.ends_with("class city_zoo"));
}

// ============================================================================
// CLI Tests
// ============================================================================

#[test]
fn test_cli_diagram_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("zoo.mmd");

    classmap()
        .arg("diagram")
        .arg(fixtures_path("zoo"))
        .arg("--output")
        .arg(&out)
        .current_dir(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("skipped broken.py"));

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("classDiagram\n"));
    assert!(text.contains("Animal <|-- Dog"));
    assert!(text.contains("class Legacy {"));
}

#[test]
fn test_cli_diagram_to_stdout() {
    let dir = TempDir::new().unwrap();

    classmap()
        .args(["diagram", "--mode", "callgraph", "--output", "-"])
        .args(["--exclude", "legacy/*", "--name", "Zoo"])
        .arg(fixtures_path("zoo"))
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("classDiagram\ndirection TD\n"))
        .stdout(predicate::str::contains("Dog : fetch() --> Keeper : feed()"))
        .stdout(predicate::str::contains("Zoo <.. Ledger"))
        .stdout(predicate::str::contains("Legacy").not());
}

#[test]
fn test_cli_reads_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("classmap.toml"),
        "[diagram]\nmode = \"callgraph\"\ndirection = \"BT\"\n\n[output]\npath = \"-\"\n",
    )
    .unwrap();

    classmap()
        .arg("diagram")
        .arg(fixtures_path("zoo"))
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("classDiagram\ndirection BT\n"));
}

#[test]
fn test_cli_max_lines() {
    let dir = TempDir::new().unwrap();

    classmap()
        .args(["diagram", "--output", "-", "--max-lines", "7"])
        .arg(fixtures_path("zoo"))
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("%% Diagram truncated: 6 of"))
        .stdout(predicate::str::contains("class Dog").not());
}

#[test]
fn test_cli_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("classmap.toml"), "[diagram]\nmax_lines = 1\n").unwrap();

    classmap()
        .arg("diagram")
        .arg(fixtures_path("zoo"))
        .current_dir(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_lines"));
}

#[test]
fn test_cli_missing_path_fails() {
    classmap()
        .args(["diagram", "/nonexistent/zoo", "--output", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_inspect_json() {
    let output = classmap()
        .args(["inspect"])
        .arg(fixtures_path("zoo"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["project_name"], "zoo");
    assert_eq!(json["skipped"]["broken.py"]["reason"], "unparsable");
    assert_eq!(
        json["model"]["files"]["animals.py"]["classes"][0]["name"],
        "Animal"
    );
}

#[test]
fn test_cli_version() {
    classmap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("classmap "));
}
