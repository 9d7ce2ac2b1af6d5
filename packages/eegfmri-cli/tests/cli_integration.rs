use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn eegfmri_clean() -> Command {
    let mut cmd = Command::cargo_bin("eegfmri-clean").unwrap();
    cmd.env_remove("EEGFMRI_CLEAN_CONFIG")
        .env_remove("EEGFMRI_CLEAN_PYTHON");
    cmd
}

fn touch(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Three subjects with one checkerboard run each, plus files that must never be picked up.
fn make_dataset() -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    for sub in ["01", "02", "03"] {
        let stem = format!("sub-{0}/eeg/sub-{0}_task-checker_run-1_eeg", sub);
        touch(root, &format!("{}.vhdr", stem), "raw");
        touch(root, &format!("{}.json", stem), "{\"SamplingFrequency\": 5000}");
    }
    touch(root, "sub-01/anat/sub-01_T1w.nii.gz", "");
    touch(root, "derivatives/GRAD/sub-01/eeg/sub-01_task-checker_run-1_eeg.fif", "old");
    touch(root, "participants.tsv", "participant_id\n");
    tmp
}

fn write_config(dir: &Path, steps: serde_json::Value) -> PathBuf {
    let path = dir.join("config.json");
    let config = serde_json::json!({ "steps": steps });
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

fn copy_config(dir: &Path) -> PathBuf {
    let cp = serde_json::json!({ "program": "cp", "args": ["{input}", "{output}"] });
    write_config(
        dir,
        serde_json::json!({ "gradient": cp, "bcg": cp, "qc": cp }),
    )
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_help_flag() {
    eegfmri_clean()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("BIDS"))
        .stdout(predicate::str::contains("--gradient"));
}

#[test]
fn test_version_flag() {
    eegfmri_clean()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("eegfmri-clean"));
}

#[test]
fn test_missing_root_is_usage_error() {
    eegfmri_clean()
        .arg("--gradient")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--root"));
}

// =============================================================================
// INPUT ERRORS
// =============================================================================

#[test]
fn test_no_step_flag() {
    let dataset = make_dataset();
    eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "--interactive, --gradient, --bcg, --qc",
        ));
}

#[test]
fn test_nonexistent_root() {
    let tmp = tempfile::tempdir().unwrap();
    let config = copy_config(tmp.path());
    eegfmri_clean()
        .arg("--root")
        .arg(tmp.path().join("missing"))
        .arg("--config")
        .arg(&config)
        .arg("--gradient")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_no_matching_files() {
    let dataset = make_dataset();
    let config = copy_config(dataset.path());
    eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .args(["--subject", "7-9", "--gradient"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No valid files found"));
}

#[test]
fn test_inverted_range() {
    let dataset = make_dataset();
    let config = copy_config(dataset.path());
    eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .args(["--subject", "3-1", "--qc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("lower than start"));
}

#[test]
fn test_invalid_config_file() {
    let dataset = make_dataset();
    let config = dataset.path().join("broken.json");
    fs::write(&config, "{ not json").unwrap();
    eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .arg("--gradient")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn test_interactive_requires_terminal() {
    let dataset = make_dataset();
    let config = copy_config(dataset.path());
    eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .arg("--interactive")
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("requires a terminal"));
}

// =============================================================================
// DRY RUN
// =============================================================================

#[test]
fn test_dry_run_lists_files() {
    let dataset = make_dataset();
    let config = copy_config(dataset.path());
    let output = eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .args(["--subject", "1-2", "--gradient", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Files: 2"));

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("sub-01_task-checker_run-1_eeg.vhdr"));
    assert!(lines[1].ends_with("sub-02_task-checker_run-1_eeg.vhdr"));
    assert!(!dataset.path().join("derivatives/GRAD/sub-02").exists());
}

#[test]
fn test_dry_run_json() {
    let dataset = make_dataset();
    let config = copy_config(dataset.path());
    let output = eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .args(["--bcg", "--gradient", "--dry-run", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["files"].as_array().unwrap().len(), 3);
    assert_eq!(parsed["steps"], serde_json::json!(["gradient", "bcg"]));
    assert_eq!(parsed["summary"]["file_count"], 3);
}

// =============================================================================
// CLEANING
// =============================================================================

#[cfg(unix)]
#[test]
fn test_full_pipeline_writes_derivatives() {
    let dataset = make_dataset();
    let config = copy_config(dataset.path());
    let report = dataset.path().join("batch.json");

    eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .arg("--report")
        .arg(&report)
        .args(["--gradient", "--bcg", "--qc"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("[3/3]"))
        .stderr(predicate::str::contains("3/3 succeeded"));

    let derivatives = dataset.path().join("derivatives");
    for sub in ["01", "02", "03"] {
        let dir = derivatives.join(format!("GRAD_BCG/sub-{}/eeg", sub));
        let stem = format!("sub-{}_task-checker_run-1_eeg", sub);
        assert_eq!(fs::read_to_string(dir.join(format!("{}.fif", stem))).unwrap(), "raw");
        assert!(dir.join(format!("{}.json", stem)).is_file());
        assert!(derivatives
            .join(format!("GRAD_BCG_QC/sub-{}/eeg/{}_qc.json", sub, stem))
            .is_file());
    }
    assert!(!derivatives.join("report.txt").exists());

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(parsed["files"].as_array().unwrap().len(), 3);
    assert_eq!(parsed["files"][0]["steps"][2]["status"], "succeeded");
}

#[cfg(unix)]
#[test]
fn test_partial_failure_continues_batch() {
    let dataset = make_dataset();
    let failing = serde_json::json!({
        "program": "sh",
        "args": [
            "-c",
            "if [ \"$1\" = 02 ]; then echo broken >&2; exit 1; fi; cp \"$2\" \"$3\"",
            "sh",
            "{subject}",
            "{input}",
            "{output}"
        ]
    });
    let cp = serde_json::json!({ "program": "cp", "args": ["{input}", "{output}"] });
    let config = write_config(
        dataset.path(),
        serde_json::json!({ "gradient": failing, "bcg": cp, "qc": cp }),
    );
    let output_dir = dataset.path().join("out");

    eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .arg("--output-dir")
        .arg(&output_dir)
        .args(["--gradient", "--bcg"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("broken"))
        .stderr(predicate::str::contains("Skipped bcg"))
        .stderr(predicate::str::contains("2/3 succeeded"));

    assert!(output_dir
        .join("GRAD_BCG/sub-01/eeg/sub-01_task-checker_run-1_eeg.fif")
        .is_file());
    assert!(!output_dir
        .join("GRAD/sub-02/eeg/sub-02_task-checker_run-1_eeg.fif")
        .exists());
    assert!(!output_dir.join("GRAD_BCG/sub-02").exists());
    assert!(output_dir
        .join("GRAD_BCG/sub-03/eeg/sub-03_task-checker_run-1_eeg.fif")
        .is_file());

    let error_log = fs::read_to_string(output_dir.join("report.txt")).unwrap();
    assert!(error_log.contains("sub-02_task-checker_run-1_eeg.vhdr"));
    assert_eq!(error_log.lines().count(), 1);
}

#[cfg(unix)]
#[test]
fn test_second_run_ignores_previous_outputs() {
    let dataset = make_dataset();
    let config = copy_config(dataset.path());
    let output_dir = dataset.path().join("out");

    for _ in 0..2 {
        eegfmri_clean()
            .arg("--root")
            .arg(dataset.path())
            .arg("--config")
            .arg(&config)
            .arg("--output-dir")
            .arg(&output_dir)
            .args(["--gradient", "--quiet"])
            .assert()
            .code(0);
    }

    let listing = eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .arg("--output-dir")
        .arg(&output_dir)
        .args(["--gradient", "--dry-run"])
        .assert()
        .success();
    let stdout = String::from_utf8(listing.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 3);
    assert!(stdout.lines().all(|l| l.ends_with(".vhdr")));
    assert!(!output_dir.join("GRAD/out").exists());
}

#[cfg(unix)]
#[test]
fn test_all_files_failing() {
    let dataset = make_dataset();
    let fail = serde_json::json!({ "program": "false" });
    let config = write_config(dataset.path(), serde_json::json!({ "qc": fail }));

    eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .args(["--qc", "--quiet"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Batch complete").not());
}

#[test]
fn test_missing_program_fails_every_file() {
    let dataset = make_dataset();
    let missing = serde_json::json!({ "program": "eegfmri-clean-no-such-program" });
    let config = write_config(dataset.path(), serde_json::json!({ "gradient": missing }));

    eegfmri_clean()
        .arg("--root")
        .arg(dataset.path())
        .arg("--config")
        .arg(&config)
        .args(["--subject", "1", "--gradient"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to execute"));
}
