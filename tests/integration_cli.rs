// Drives the compiled binary without a terminal attached.

use assert_cmd::Command;

#[test]
fn refuses_to_start_without_a_tty() {
    let assert = Command::cargo_bin("quizr")
        .unwrap()
        .write_stdin("")
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("stdin must be a tty"), "stderr: {stderr}");
}

#[test]
fn help_lists_quiz_options() {
    let assert = Command::cargo_bin("quizr")
        .unwrap()
        .arg("--help")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    for flag in ["--amount", "--category", "--difficulty", "--refresh", "--export-dir"] {
        assert!(stdout.contains(flag), "missing {flag} in help");
    }
}
