// Regression tests for the easyssh binary: listing, explaining, diagnostics and a real run.

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn easyssh() -> Command {
    let mut cmd = Command::cargo_bin("easyssh").unwrap();
    for var in [
        "EASYSSH_DISCOVERER",
        "EASYSSH_FILTER",
        "EASYSSH_EXECUTOR",
        "EASYSSH_LOGIN",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn list_nodes_prints_every_family() {
    easyssh().arg("--list-nodes").assert().success().stdout(
        contains("discoverers:")
            .and(contains("comma-separated"))
            .and(contains("ec2-instance-id"))
            .and(contains("ssh-exec-parallel")),
    );
}

#[test]
fn explain_shows_rewrites_and_descriptions() {
    easyssh()
        .args(["--explain", "-e", "(csshx)"])
        .assert()
        .success()
        .stdout(
            contains("Step 1: csshx")
                .and(contains("<assert-no-command <external-interactive [csshx]>>"))
                .and(contains("<separated-by ,>")),
        );
}

#[test]
fn syntax_errors_are_miette_diagnostics() {
    easyssh()
        .args(["-f", "(list (id)", "a,b"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("easyssh::syntax"));
}

#[test]
fn unknown_nodes_list_the_alternatives() {
    easyssh()
        .args(["-e", "(mosh)", "a"])
        .assert()
        .failure()
        .stderr(contains("easyssh::unknown_node").and(contains("ssh-login")));
}

#[test]
fn targets_are_required() {
    easyssh().assert().failure();
}

#[cfg(unix)]
#[test]
fn runs_a_real_program_on_the_targets() {
    easyssh()
        .args(["-d", "(comma-separated)", "-e", "(external echo)", "a,b"])
        .assert()
        .success()
        .stdout(contains("(STDOUT) a b"));
}

#[cfg(unix)]
#[test]
fn empty_target_list_fails() {
    easyssh()
        .args(["-d", "(comma-separated)", "-e", "(external echo)", ","])
        .assert()
        .failure()
        .stderr(contains("easyssh::no_targets"));
}

#[cfg(unix)]
#[test]
fn quiet_keeps_job_output() {
    easyssh()
        .args([
            "-q",
            "-d",
            "(comma-separated)",
            "-e",
            "(external-sequential echo)",
            "a",
            "hello",
        ])
        .assert()
        .success()
        .stdout(contains("[a] (STDOUT) a hello"));
}

#[cfg(unix)]
#[test]
fn job_stderr_goes_to_stderr() {
    easyssh()
        .args([
            "-d",
            "(comma-separated)",
            "-e",
            "(external-sequential sh -c \"echo oops >&2\")",
            "a",
        ])
        .assert()
        .success()
        .stderr(contains("[a] (STDERR) oops"))
        .stdout(contains("(STDERR)").not());
}

#[test]
fn deeply_nested_definitions_are_rejected() {
    let depth = 20_000;
    let definition = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
    easyssh()
        .args(["-f", definition.as_str(), "a"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("easyssh::syntax"));
}
