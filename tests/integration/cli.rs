use assert_cmd::Command;
use predicates::prelude::*;
use snipkit::test_utils::{SnippetFixture, TestEnvironment};

fn snipkit(env: &TestEnvironment) -> Command {
    let mut cmd = Command::cargo_bin("snipkit").unwrap();
    cmd.env("SNIPKIT_CONFIG", env.config_path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_preview_prints_static_text() {
    let env = TestEnvironment::new().unwrap();
    let path = env.add_snippet_file("demo.toml", &SnippetFixture::arrow().content).unwrap();

    snipkit(&env)
        .arg("preview")
        .arg(&path)
        .arg("--plain")
        .assert()
        .success()
        .stdout("a -> a == a\n");
}

#[test]
fn test_preview_unknown_trigger_fails() {
    let env = TestEnvironment::new().unwrap();
    let path = env.add_snippet_file("demo.toml", &SnippetFixture::arrow().content).unwrap();

    snipkit(&env)
        .args(["preview", "--trigger", "nope"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No snippet with trigger 'nope'"));
}

#[test]
fn test_check_reports_broken_snippets() {
    let env = TestEnvironment::new().unwrap();
    let good = env.add_snippet_file("good.toml", &SnippetFixture::choice().content).unwrap();
    let mixed = env.add_snippet_file("mixed.toml", &SnippetFixture::mixed().content).unwrap();

    snipkit(&env).arg("check").arg(&good).assert().success();

    snipkit(&env)
        .arg("check")
        .arg(&good)
        .arg(&mixed)
        .assert()
        .failure()
        .stdout(predicate::str::contains("broken"))
        .stderr(predicate::str::contains("1 of 4 snippets failed to compile"));
}

#[test]
fn test_session_script() {
    let env = TestEnvironment::new().unwrap();
    let path = env.add_snippet_file("demo.toml", &SnippetFixture::choice().content).unwrap();

    snipkit(&env)
        .arg("session")
        .arg(&path)
        .args(["--trigger", "choice"])
        .write_stdin("show\nselect 2 2\nedit 2.2 x\nupdate\nshow\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("cccc aaaa\n"))
        .stdout(predicate::str::ends_with("cccc xxcccc\n"));
}

#[test]
fn test_session_json_output() {
    let env = TestEnvironment::new().unwrap();
    let path = env.add_snippet_file("demo.toml", &SnippetFixture::arrow().content).unwrap();

    let output = snipkit(&env)
        .arg("session")
        .arg(&path)
        .args(["--trigger", "arrow", "--format", "json"])
        .write_stdin("edit 1 b\njump next\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let jump: serde_json::Value = serde_json::from_str(stdout.lines().nth(1).unwrap()).unwrap();
    assert_eq!(jump["command"], "jump");
    assert!(jump["outcome"]["node"].is_null());
    assert_eq!(jump["outcome"]["report"]["deltas"].as_array().unwrap().len(), 2);
}

#[test]
fn test_session_error_names_the_line() {
    let env = TestEnvironment::new().unwrap();
    let path = env.add_snippet_file("demo.toml", &SnippetFixture::choice().content).unwrap();

    snipkit(&env)
        .arg("session")
        .arg(&path)
        .args(["--trigger", "choice"])
        .write_stdin("# dormant branch\nedit 2.2 x\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Line 2"));
}

#[test]
fn test_list_uses_configured_directories() {
    let env = TestEnvironment::new().unwrap();
    env.add_snippet_file("rust.toml", &SnippetFixture::arrow().content).unwrap();
    env.write_config("").unwrap();

    snipkit(&env)
        .args(["list", "--filetype", "rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("arrow"))
        .stdout(predicate::str::contains("mirrored tabstop"));

    snipkit(&env)
        .args(["list", "--filetype", "go"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No snippets found for filetype 'go'"));
}

#[test]
fn test_invalid_config_is_reported() {
    let env = TestEnvironment::new().unwrap();
    env.write_config("unknown_key = 1\n").unwrap();
    let path = env.add_snippet_file("demo.toml", &SnippetFixture::arrow().content).unwrap();

    snipkit(&env).arg("preview").arg(&path).assert().failure();
}
