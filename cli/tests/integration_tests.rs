use std::fs;
use std::path::PathBuf;
use std::process::Command;

/// Helper to create a temp directory that is cleaned up on drop.
struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("cmdbind_cli_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("failed to create temp dir");
        Self { path }
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(&path, contents).expect("failed to write file");
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cmdbind-check"))
}

const GREET: &str = r#"
use cmdbind::{Flag, MetaFlag, main_function};

#[main_function(shadow_groups = ["lower upper"])]
fn m1_greet(
    #[arg(label = u)] upper: Flag,
    #[arg(label = l)] lower: Flag,
    #[arg(label = h__help, default = MetaFlag::help("usage"))] help: MetaFlag,
    #[arg(positional)] name: String,
) {
    println!("{name}");
}
"#;

const BROKEN: &str = r#"
#[call_function(shadow_groups = ["upper upperX"])]
fn shout(
    #[arg(label = u, default = true)] upper: Flag,
    #[arg(label = "dry-run")] dry_run: Flag,
) {}
"#;

const ACTION: &str = r#"
struct Widget;

#[command_action]
fn build(#[arg(label = s, default = 1)] size: u32) -> Vec<Widget> {
    vec![]
}
"#;

#[test]
fn check_accepts_valid_functions() {
    let dir = TempDir::new("check_valid");
    dir.write("src/main.rs", GREET);
    dir.write("src/action.rs", ACTION);

    let output = bin()
        .args(["check", dir.path().to_str().unwrap()])
        .output()
        .expect("failed to run cmdbind-check");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Checked 2 work function(s) in 2 file(s): 0 diagnostic(s)"));
}

#[test]
fn check_reports_every_diagnostic_and_fails() {
    let dir = TempDir::new("check_broken");
    let path = dir.write("broken.rs", BROKEN);

    let output = bin()
        .args(["check", path.to_str().unwrap(), "--jobs", "2"])
        .output()
        .expect("failed to run cmdbind-check");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("shout: [type-constraint]"));
    assert!(stdout.contains("shout: [label-syntax]"));
    assert!(stdout.contains("shout: [shadow-group-unknown-name] unrecognized shadowed parameter name: 'upperX'"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: check failed: 3 diagnostic(s)"));
}

#[test]
fn check_rejects_missing_paths() {
    let output = bin()
        .args(["check", "/definitely/not/a/source.rs"])
        .output()
        .expect("failed to run cmdbind-check");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"));
}

#[test]
fn check_reports_unparsable_files() {
    let dir = TempDir::new("check_unparsable");
    dir.write("bad.rs", "fn broken( {");

    let output = bin()
        .args(["check", dir.path().to_str().unwrap()])
        .output()
        .expect("failed to run cmdbind-check");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to parse"));
}

#[test]
fn inspect_prints_json_binding() {
    let dir = TempDir::new("inspect_json");
    let path = dir.write("main.rs", GREET);

    let output = bin()
        .args(["inspect", "--input", path.to_str().unwrap()])
        .output()
        .expect("failed to run cmdbind-check");

    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("inspect should print JSON");
    let binding = &value[0]["binding"];
    assert_eq!(binding["call_name"], "m1-greet");
    assert_eq!(binding["config"]["shadow_groups"][0], "lower upper");
    assert_eq!(binding["config"]["meta_flags"][0]["parameter"], "help");
    assert_eq!(binding["config"]["labels"][2]["short"], "h");
    assert_eq!(binding["config"]["labels"][2]["long"], "help");
}

#[test]
fn inspect_shows_synthesized_state() {
    let dir = TempDir::new("inspect_state");
    let path = dir.write("action.rs", ACTION);

    let output = bin()
        .args([
            "inspect",
            "--input",
            path.to_str().unwrap(),
            "--function",
            "build",
            "--format",
            "table",
        ])
        .output()
        .expect("failed to run cmdbind-check");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("build  #[command_action]"));
    assert!(stdout.contains("State: Widget (synthesized)"));
}

#[test]
fn inspect_unknown_function_fails() {
    let dir = TempDir::new("inspect_unknown");
    let path = dir.write("main.rs", GREET);

    let output = bin()
        .args(["inspect", "--input", path.to_str().unwrap(), "--function", "nope"])
        .output()
        .expect("failed to run cmdbind-check");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No annotated function named 'nope'"));
}

#[test]
fn config_renames_reserved_types() {
    let dir = TempDir::new("config_rename");
    let config = dir.write("options.yaml", "flag_type: Switch\n");
    let path = dir.write(
        "main.rs",
        r#"
        #[call_function]
        fn run(#[arg(label = v)] verbose: Switch) {}
        "#,
    );

    let output = bin()
        .args([
            "--config",
            config.to_str().unwrap(),
            "inspect",
            "--input",
            path.to_str().unwrap(),
            "--format",
            "yaml",
        ])
        .output()
        .expect("failed to run cmdbind-check");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("category: flag"));
}
