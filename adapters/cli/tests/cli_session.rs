use std::process::Command;

#[test]
fn headless_session_reports_json_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_centipede"))
        .args(["--frames", "120", "--fps", "30", "--fire-every", "6", "--json"])
        .output()
        .expect("failed to launch the centipede binary");

    assert!(output.status.success(), "centipede exited with {:?}", output.status);
    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary is valid JSON");
    assert_eq!(summary["frames"], 120);
    assert!(summary["shots_fired"].as_u64().is_some_and(|shots| shots > 0));
    assert!(summary["remaining"]["Obstacle"].as_u64().is_some());
}

#[test]
fn unreadable_configuration_fails_with_context() {
    let output = Command::new(env!("CARGO_BIN_EXE_centipede"))
        .args(["--config", "does/not/exist.toml"])
        .output()
        .expect("failed to launch the centipede binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read configuration"), "{stderr}");
}
