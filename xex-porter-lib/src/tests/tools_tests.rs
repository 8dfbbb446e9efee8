use super::*;

use std::path::PathBuf;

fn args(list: &[&str]) -> Vec<OsString> {
    list.iter().map(OsString::from).collect()
}

#[test]
fn combined_joins_streams() {
    let out = ToolOutput {
        exit_code: Some(0),
        stdout: "line one".to_string(),
        stderr: "warning".to_string(),
    };
    assert_eq!(out.combined(), "line one\nwarning");
}

#[test]
fn check_reports_exit_code() {
    let out = ToolOutput {
        exit_code: Some(2),
        stdout: String::new(),
        stderr: "bad input\n".to_string(),
    };
    match out.check(Path::new("/opt/tools/xextool")) {
        Err(ToolError::Failed { tool, code, stderr }) => {
            assert_eq!(tool, "xextool");
            assert_eq!(code, Some(2));
            assert_eq!(stderr, "bad input");
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn missing_tool_is_reported() {
    let err = SystemToolRunner
        .invoke(
            &PathBuf::from("definitely-not-a-real-tool-xyz"),
            &[],
            None,
            Duration::from_secs(5),
        )
        .unwrap_err();
    assert!(matches!(err, ToolError::Missing { .. }));
}

#[cfg(unix)]
#[test]
fn captures_output_and_exit_code() {
    let out = SystemToolRunner
        .invoke(
            Path::new("sh"),
            &args(&["-c", "echo hello; echo oops >&2; exit 3"]),
            None,
            Duration::from_secs(10),
        )
        .unwrap();
    assert_eq!(out.exit_code, Some(3));
    assert_eq!(out.stdout.trim(), "hello");
    assert_eq!(out.stderr.trim(), "oops");
    assert!(!out.success());
}

#[cfg(unix)]
#[test]
fn runs_in_working_directory() {
    let tmp = tempfile::tempdir().unwrap();
    SystemToolRunner
        .invoke(
            Path::new("sh"),
            &args(&["-c", "echo data > made_here.txt"]),
            Some(tmp.path()),
            Duration::from_secs(10),
        )
        .unwrap()
        .check(Path::new("sh"))
        .unwrap();
    assert!(tmp.path().join("made_here.txt").exists());
}

#[cfg(unix)]
#[test]
fn large_output_does_not_stall() {
    let out = SystemToolRunner
        .invoke(
            Path::new("sh"),
            &args(&["-c", "i=0; while [ $i -lt 20000 ]; do echo 0123456789abcdef; i=$((i+1)); done"]),
            None,
            Duration::from_secs(30),
        )
        .unwrap();
    assert!(out.success());
    assert_eq!(out.stdout.lines().count(), 20000);
}

#[cfg(unix)]
#[test]
fn timeout_kills_child() {
    let err = SystemToolRunner
        .invoke(
            Path::new("sleep"),
            &args(&["10"]),
            None,
            Duration::from_millis(200),
        )
        .unwrap_err();
    assert!(matches!(err, ToolError::Timeout { .. }));
}

#[cfg(unix)]
#[test]
fn timeout_returns_while_grandchild_holds_pipes() {
    let started = std::time::Instant::now();
    let err = SystemToolRunner
        .invoke(
            Path::new("sh"),
            &args(&["-c", "sleep 5 & sleep 5"]),
            None,
            Duration::from_millis(200),
        )
        .unwrap_err();
    assert!(matches!(err, ToolError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
}
