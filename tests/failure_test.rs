//! Failure paths: nothing may be left behind.

mod common;

use common::{fixtures, TestRun};

fn geometry_args(geometry: &[String]) -> Vec<&str> {
    geometry.iter().map(String::as_str).collect()
}

#[cfg(unix)]
#[test]
fn test_killed_stage_leaves_no_output() {
    let run = TestRun::new();
    run.write_input("flat.raw", &fixtures::flat_gray(4, 4, 128));
    // $2 is the parent pid handed to every stage.
    let filters = run.write_filter(
        "filters",
        "probe",
        "touch \"$TMPDIR/$2.0.s.k\"\nkill -9 $$",
    );
    let filters = filters.display().to_string();
    let geometry = fixtures::geometry(4, 4);
    let mut args = geometry_args(&geometry);
    args.extend_from_slice(&["-F", filters.as_str(), "-f", "probe", "flat.raw"]);

    let output = run.run(&args);

    common::assert_failure(&output, "Stage 0 (probe) failed");
    common::assert_no_temporaries(&run);
    assert!(!run.path("flat.eps").exists());
}

#[test]
fn test_short_input_fails() {
    let run = TestRun::new();
    run.write_input("short.raw", &fixtures::flat_gray(4, 2, 128));
    let geometry = fixtures::geometry(4, 4);
    let mut args = geometry_args(&geometry);
    args.push("short.raw");

    let output = run.run(&args);

    common::assert_failure(&output, "Image stream suddenly closed");
    common::assert_no_temporaries(&run);
    assert!(!run.path("short.eps").exists());
}

#[cfg(unix)]
#[test]
fn test_hung_stage_hits_deadline() {
    let run = TestRun::new();
    run.write_input("flat.raw", &fixtures::flat_gray(2, 2, 1));
    let filters = run.write_filter("filters", "hang", "exec sleep 30");
    let filters = filters.display().to_string();
    let geometry = fixtures::geometry(2, 2);
    let mut args = geometry_args(&geometry);
    args.extend_from_slice(&[
        "--stage-timeout",
        "1",
        "-F",
        filters.as_str(),
        "-f",
        "hang",
        "flat.raw",
    ]);

    let started = std::time::Instant::now();
    let output = run.run(&args);

    common::assert_failure(&output, "did not finish within 1 s");
    assert!(started.elapsed() < std::time::Duration::from_secs(20));
    assert!(!run.path("flat.eps").exists());
}

#[cfg(unix)]
#[test]
fn test_missing_external_filter() {
    let run = TestRun::new();
    run.write_input("flat.raw", &fixtures::flat_gray(2, 2, 1));
    let empty = run.path("nothing");
    std::fs::create_dir(&empty).unwrap();
    let empty = empty.display().to_string();
    let geometry = fixtures::geometry(2, 2);
    let mut args = geometry_args(&geometry);
    args.extend_from_slice(&["-F", empty.as_str(), "-f", "absent", "flat.raw"]);

    let output = run.run(&args);

    common::assert_failure(&output, "Can't start stage 0");
    common::assert_no_temporaries(&run);
}

#[test]
fn test_invalid_stage_option() {
    let run = TestRun::new();
    run.write_input("flat.raw", &fixtures::flat_gray(2, 2, 1));
    let geometry = fixtures::geometry(2, 2);
    let mut args = geometry_args(&geometry);
    args.extend_from_slice(&["-f", "tile32", "--select-mask=Q", "flat.raw"]);

    let output = run.run(&args);

    common::assert_failure(&output, "Stage 0 (tile32) failed");
    common::assert_no_temporaries(&run);
}
