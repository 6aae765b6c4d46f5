use std::process::Command;

const TEMPLATE: &str = "\
categories:
  code: Code
basic:
  code:
    - claim: Commit message is clear
      explain: ''
    - condition: new-file-add
      claim: New files carry a license header
      explain: ''
customization:
  community:
    - condition: sanity_check
      claim: Sanity check passed
      explain: ''
";

#[test]
fn lists_items_with_conditions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checklist.yaml");
    std::fs::write(&path, TEMPLATE).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_warden"))
        .arg("check-template")
        .arg(&path)
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "check-template failed: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("always"));
    assert!(stdout.contains("new-file-add"));
    assert!(stdout.contains("customization.community"));
    assert!(stdout.contains("3 items (1 with conditions that are not detected yet)"));
}

#[test]
fn json_output_is_parseable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checklist.yaml");
    std::fs::write(&path, TEMPLATE).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_warden"))
        .args(["--format", "json", "check-template"])
        .arg(&path)
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let items: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["category"], "Code");
    assert_eq!(items[1]["condition"], "new-file-add");
}

#[test]
fn missing_template_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_warden"))
        .args(["check-template", "does-not-exist.yaml"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
}
