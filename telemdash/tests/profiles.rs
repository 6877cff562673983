//! Tests for profile load/save and resolution through the binary (non-interactive paths only)
use std::fs;
use std::process::{Command, Stdio};
use std::sync::Mutex;

// Global lock to serialize tests that mutate process-wide environment variables.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn run_telemdash(args: &[&str]) -> (bool, String) {
    let exe = env!("CARGO_BIN_EXE_telemdash");
    let output = Command::new(exe)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("run telemdash");
    let ok = output.status.success();
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (ok, text)
}

/// Point XDG_CONFIG_HOME at a fresh temp dir for the duration of a test.
fn isolated_config() -> tempfile::TempDir {
    let td = tempfile::tempdir().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", td.path());
    td
}

fn profiles_path() -> std::path::PathBuf {
    telemdash::profiles::profiles_path()
}

#[test]
fn profile_created_on_first_use() {
    let _guard = ENV_LOCK.lock().unwrap();
    let _td = isolated_config();
    let (_ok, out) = run_telemdash(&["--profile", "bench", "--host", "10.1.2.3", "--dry-run"]);
    assert!(out.contains("device 10.1.2.3:8001 every 1.0s"), "{out}");
    let data = fs::read_to_string(profiles_path()).expect("profiles.json created");
    assert!(data.contains("bench") && data.contains("10.1.2.3"), "{data}");
}

#[test]
fn profile_loaded_by_name_with_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    let _td = isolated_config();
    run_telemdash(&["-P", "lab", "-H", "lab.local", "-p", "9100", "-i", "0.5", "--dry-run"]);
    let (ok, out) = run_telemdash(&["-P", "lab", "--dry-run"]);
    assert!(ok);
    assert!(out.contains("device lab.local:9100 every 0.5s"), "{out}");
    let (_ok, out) = run_telemdash(&["-P", "lab", "--interval", "5", "--dry-run"]);
    assert!(out.contains("device lab.local:9100 every 5.0s"), "{out}");
}

#[test]
fn profile_overwrite_only_with_save() {
    let _guard = ENV_LOCK.lock().unwrap();
    let _td = isolated_config();
    run_telemdash(&["--profile", "prod", "--host", "one", "--dry-run"]);
    let first = fs::read_to_string(profiles_path()).unwrap();

    // identical input leaves the file alone
    run_telemdash(&["--profile", "prod", "--host", "one", "--dry-run"]);
    assert_eq!(first, fs::read_to_string(profiles_path()).unwrap());

    // different host without --save: the prompt reads EOF and declines
    run_telemdash(&["--profile", "prod", "--host", "two", "--dry-run"]);
    assert_eq!(first, fs::read_to_string(profiles_path()).unwrap());

    run_telemdash(&["--profile", "prod", "--save", "--host", "two", "--dry-run"]);
    let third = fs::read_to_string(profiles_path()).unwrap();
    assert!(third.contains("two"), "updated host not written: {third}");
}

#[test]
fn missing_profile_is_reported() {
    let _guard = ENV_LOCK.lock().unwrap();
    let _td = isolated_config();
    let (ok, out) = run_telemdash(&["--profile", "ghost", "--dry-run"]);
    assert!(ok);
    assert!(out.contains("Profile 'ghost' does not exist"), "{out}");
    assert!(!profiles_path().exists());
}

#[test]
fn defaults_to_local_simulator() {
    let _guard = ENV_LOCK.lock().unwrap();
    let _td = isolated_config();
    let (_ok, out) = run_telemdash(&["--dry-run"]);
    assert!(out.contains("device 127.0.0.1:8001 every 1.0s"), "{out}");
}
