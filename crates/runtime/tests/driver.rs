use std::process::Command;

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ensemble_main"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("failed to launch ensemble_main")
}

#[test]
fn small_run_reports_elites() {
    let output = run(&[
        "--network-size", "3",
        "--elite-size", "2",
        "--state-size", "4",
        "--action-size", "2",
        "--reward-size", "1",
        "--hidden-size", "8",
        "--samples", "60",
        "--chunk", "20",
        "--batch-size", "16",
        "--predict-rows", "10",
        "--seed", "3",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("held-out MSE"), "stdout: {stdout}");
    assert!(stdout.contains("Prediction shape: [3, 10, 5]"), "stdout: {stdout}");
}

#[test]
fn config_file_is_honoured() {
    let dir = std::env::temp_dir().join(format!("ensemble_main_cfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("ensemble.json");
    std::fs::write(
        &path,
        r#"{ "network_size": 2, "elite_size": 1, "state_size": 2, "action_size": 1,
             "hidden_size": 4, "loss_tracking": "epoch_mean" }"#,
    )
    .unwrap();

    let output = run(&["--config", path.to_str().unwrap(), "--samples", "12", "--chunk", "6", "--predict-rows", "3"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Prediction shape: [2, 3, 3]"), "stdout: {stdout}");
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn invalid_elite_size_fails() {
    let output = run(&["--network-size", "2", "--elite-size", "3", "--samples", "4"]);
    assert!(!output.status.success());
}
