use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::process::ExitCode;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::run;

const RULES: &str = r#"
language: typescript
api_names: [gridApi]
replacements:
  - id: set-dom-layout
    pattern: $API.setDomLayout($VALUE)
    template: '$API.setGridOption("domLayout", $VALUE)'
    captures: { API: expression, VALUE: expression }
    subject: API
deprecations:
  - id: show-loading-overlay
    pattern: $API.showLoadingOverlay()
    message: showLoadingOverlay() must be migrated by hand
    subject: API
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).display().to_string()
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name)).expect("read")
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("rules.yaml"), RULES).expect("rules");
    fs::write(
        dir.path().join("grid.ts"),
        "gridApi.setDomLayout(value);\ngridApi.showLoadingOverlay();\n",
    )
    .expect("source");
    Workspace { dir }
}

struct Outcome {
    code: ExitCode,
    stdout: String,
    stderr: String,
}

fn invoke(args: &[&str], stdin: &str) -> Outcome {
    let argv: Vec<OsString> = std::iter::once("mender")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let mut input = Cursor::new(stdin.as_bytes().to_vec());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(argv, &mut input, &mut stdout, &mut stderr);
    Outcome {
        code,
        stdout: String::from_utf8(stdout).expect("stdout utf-8"),
        stderr: String::from_utf8(stderr).expect("stderr utf-8"),
    }
}

#[rstest]
fn run_rewrites_the_file_and_reports_deprecations(workspace: Workspace) {
    let rules = workspace.path("rules.yaml");
    let grid = workspace.path("grid.ts");

    let outcome = invoke(&["run", "--rules", &rules, "--input-file", &grid], "");

    assert_eq!(outcome.code, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(
        workspace.read("grid.ts"),
        "gridApi.setGridOption(\"domLayout\", value);\ngridApi.showLoadingOverlay();\n"
    );
    let reply: serde_json::Value = serde_json::from_str(&outcome.stdout).expect("json");
    assert_eq!(reply["errors"][0]["rule"], "show-loading-overlay");
    assert_eq!(reply["errors"][0]["location"]["line"], 2);
}

#[rstest]
fn dry_runs_leave_the_file_alone(workspace: Workspace) {
    let rules = workspace.path("rules.yaml");
    let grid = workspace.path("grid.ts");

    let outcome = invoke(
        &["run", "--rules", &rules, "--input-file", &grid, "--dry-run"],
        "",
    );

    assert_eq!(outcome.code, ExitCode::SUCCESS);
    assert!(workspace.read("grid.ts").starts_with("gridApi.setDomLayout(value);"));
    assert!(outcome.stdout.contains("setGridOption"));
}

#[rstest]
fn workers_answer_the_request_on_stdout(workspace: Workspace) {
    let rules = workspace.path("rules.yaml");
    let request = serde_json::json!({
        "inputFilePath": workspace.path("grid.ts"),
        "dryRun": true,
        "applyDangerousEdits": false,
    })
    .to_string();

    let outcome = invoke(&["worker", "--rules", &rules], &format!("{request}\n"));

    assert_eq!(outcome.code, ExitCode::SUCCESS);
    assert_eq!(outcome.stdout.lines().count(), 1);
    let reply: serde_json::Value = serde_json::from_str(&outcome.stdout).expect("json");
    assert_eq!(reply["success"], true);
}

#[rstest]
fn workers_with_broken_rules_still_reply(workspace: Workspace) {
    let missing = workspace.path("missing.yaml");

    let outcome = invoke(&["worker", "--rules", &missing], "");

    assert_eq!(outcome.code, ExitCode::FAILURE);
    let reply: serde_json::Value = serde_json::from_str(&outcome.stdout).expect("json");
    assert_eq!(reply["success"], false);
    assert_eq!(reply["error"]["name"], "RuleFileError");
}

#[rstest]
fn missing_input_files_fail(workspace: Workspace) {
    let rules = workspace.path("rules.yaml");
    let absent = workspace.path("absent.ts");

    let outcome = invoke(&["run", "--rules", &rules, "--input-file", &absent], "");

    assert_eq!(outcome.code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("File not found"));
    assert!(outcome.stdout.is_empty());
}

#[test]
fn help_goes_to_stdout() {
    let outcome = invoke(&["--help"], "");

    assert_eq!(outcome.code, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("dispatch"));
}

#[rstest]
#[case(&["frobnicate"])]
#[case(&["run"])]
fn usage_errors_exit_with_two(#[case] args: &[&str]) {
    let outcome = invoke(args, "");

    assert_eq!(outcome.code, ExitCode::from(2));
    assert!(!outcome.stderr.is_empty());
}

#[test]
fn invalid_configuration_is_reported() {
    let outcome = invoke(
        &["--workers", "0", "run", "--rules", "r.yaml", "--input-file", "a.ts"],
        "",
    );

    assert_eq!(outcome.code, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("worker count must be a positive integer"));
    assert!(!Path::new("a.ts").exists());
}
