//! End-to-end smoke test for gov-cli.
//!
//! Spawns the real binary against a temp actions file and a fresh in-memory
//! evidence store, and asserts the process exits cleanly.
//!
//! Run with:
//!   cargo test -p gov-cli --test smoke

use std::process::Command;

fn write_actions_file(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("actions.json");
    // No actor holds GOVERNANCE:* or METRIC.WRITE at a fresh boot, so this
    // batch is expected to fail every action's guard check — the point of
    // this smoke test is that the binary starts, replays an empty chain,
    // parses the batch, and exits 0 having logged the rejections.
    let actions = serde_json::json!([
        {
            "action_id": "a1",
            "initiator": "alice",
            "payload": { "metric_id": "coin", "value": 10 },
            "timestamp": { "epoch": 1, "logical": 1 },
            "expires_at": null,
            "signature": "TRUSTED"
        }
    ]);
    std::fs::write(&path, serde_json::to_vec_pretty(&actions).unwrap()).unwrap();
    path
}

#[test]
fn keygen_prints_a_public_key() {
    let output = Command::new(env!("CARGO_BIN_EXE_gov-cli")).arg("keygen").output().expect("spawn gov-cli keygen");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("public_key:"));
}

#[test]
fn run_against_fresh_in_memory_store_exits_cleanly() {
    let dir = tempdir();
    let actions_path = write_actions_file(dir.path());

    let output = Command::new(env!("CARGO_BIN_EXE_gov-cli"))
        .arg("run")
        .arg("--actions")
        .arg(&actions_path)
        .output()
        .expect("spawn gov-cli run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

fn tempdir() -> TempDir {
    let path = std::env::temp_dir().join(format!("gov-cli-smoke-{}", std::process::id()));
    std::fs::create_dir_all(&path).unwrap();
    TempDir(path)
}

struct TempDir(std::path::PathBuf);

impl TempDir {
    fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
