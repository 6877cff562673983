//! CLI arg parsing tests for telemdash
use assert_cmd::Command;

fn run(args: &[&str]) -> (bool, String) {
    let out = Command::cargo_bin("telemdash")
        .expect("telemdash binary")
        .args(args)
        .output()
        .expect("run telemdash");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    (out.status.success(), text)
}

#[test]
fn help_mentions_short_and_long_flags() {
    let (ok, text) = run(&["--help"]);
    assert!(ok);
    for flag in ["--host", "-H", "--port", "-p", "--interval", "-i", "--profile", "-P", "--headless"] {
        assert!(text.contains(flag), "help text missing {flag}\n{text}");
    }
}

#[test]
fn flags_before_help_are_accepted() {
    for args in [
        &["--host", "10.0.0.9", "--help"][..],
        &["-H", "10.0.0.9", "-p", "9000", "--help"][..],
        &["--profile", "dev", "--help"][..],
        &["--interval=2.0", "--help"][..],
    ] {
        let (ok, text) = run(args);
        assert!(ok, "{args:?} failed: {text}");
        assert!(text.contains("Usage:"), "{args:?}: {text}");
    }
}

#[test]
fn invalid_port_is_reported_not_used() {
    let (_ok, text) = run(&["--port", "70000", "--dry-run"]);
    assert!(text.contains("Port must be a number between 1 and 65535"), "{text}");
    assert!(!text.contains("device "), "{text}");
}
