use std::{fs, process::Command};

use tempfile::tempdir;

const INPUT: &str = "Hamburg;12.3\nHamburg;8.7\nPalma;30.1\n";
const REPORT: &str = "{Hamburg=8.7/10.5/12.3, Palma=30.1/30.1/30.1}";

fn brc_stats() -> Command {
    Command::new(env!("CARGO_BIN_EXE_brc_stats"))
}

#[test]
fn prints_report_on_stdout_only() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("measurements.txt");
    fs::write(&path, INPUT).unwrap();

    let out = brc_stats().arg(&path).args(["-w", "3"]).output().unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8(out.stdout).unwrap(), format!("{REPORT}\n"));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Run completed in"));
}

#[test]
fn stores_and_verifies_results() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("measurements.txt");
    let stored = dir.path().join("my_results.txt");
    let expected = dir.path().join("correct_results.txt");
    fs::write(&path, INPUT).unwrap();
    fs::write(&expected, format!("{REPORT}\n")).unwrap();

    let out = brc_stats()
        .arg(&path)
        .arg("--output")
        .arg(&stored)
        .arg("--expected")
        .arg(&expected)
        .args(["--hash", "murmur3"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(fs::read_to_string(&stored).unwrap(), REPORT);
    assert!(String::from_utf8_lossy(&out.stderr).contains("PASSED!"));
}

#[test]
fn mismatching_expectation_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("measurements.txt");
    let expected = dir.path().join("correct_results.txt");
    fs::write(&path, INPUT).unwrap();
    fs::write(&expected, "{Hamburg=8.7/10.4/12.3, Palma=30.1/30.1/30.1}").unwrap();

    let out = brc_stats().arg(&path).arg("-e").arg(&expected).output().unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Data does not match for key Hamburg"), "{stderr}");
}

#[test]
fn malformed_input_exits_with_error_and_no_report() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("measurements.txt");
    fs::write(&path, "Hamburg;12.3\nPalma;abc\n").unwrap();

    let out = brc_stats().arg(&path).output().unwrap();
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid value"));
}

#[test]
fn zero_workers_is_rejected() {
    let out = brc_stats().args(["x.txt", "-w", "0"]).output().unwrap();
    assert!(!out.status.success());
}

#[test]
fn hashbench_reports_every_hash() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("stations.csv");
    fs::write(&corpus, "# stations\nHamburg;53.5\nPalma;39.5\nAa\nBB\n").unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_hashbench"))
        .arg(&corpus)
        .args(["--iterations", "1000", "--rounds", "1", "--rng-seed", "1", "--show-collisions"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("4 names"));
    assert!(!stdout.contains("FAILED"));
    assert!(stdout.contains("polynomial max=2"));
    assert!(stdout.contains("    Aa, BB"));
    for name in ["murmur3", "xxhash32", "polynomial"] {
        assert!(stdout.contains(&format!("round 1 {name} ")), "{stdout}");
    }
}
