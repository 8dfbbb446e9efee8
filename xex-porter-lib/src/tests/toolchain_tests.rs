use super::*;

use std::cell::RefCell;
use std::time::Duration;

use xex_porter_core::GameIdentity;

/// Records every call and answers through a closure.
struct ScriptedRunner {
    calls: RefCell<Vec<(PathBuf, Vec<String>, Option<PathBuf>)>>,
    respond: Box<dyn Fn(&Path, &[OsString], Option<&Path>) -> Result<ToolOutput, ToolError>>,
}

impl ScriptedRunner {
    fn new(
        respond: impl Fn(&Path, &[OsString], Option<&Path>) -> Result<ToolOutput, ToolError> + 'static,
    ) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    fn calls(&self) -> Vec<(PathBuf, Vec<String>, Option<PathBuf>)> {
        self.calls.borrow().clone()
    }
}

impl ToolRunner for ScriptedRunner {
    fn invoke(
        &self,
        tool: &Path,
        args: &[OsString],
        cwd: Option<&Path>,
        _timeout: Duration,
    ) -> Result<ToolOutput, ToolError> {
        self.calls.borrow_mut().push((
            tool.to_path_buf(),
            args.iter().map(|a| a.to_string_lossy().into_owned()).collect(),
            cwd.map(Path::to_path_buf),
        ));
        (self.respond)(tool, args, cwd)
    }
}

fn ok(stdout: &str) -> Result<ToolOutput, ToolError> {
    Ok(ToolOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    })
}

fn settings() -> Settings {
    Settings::from_env(|_| None)
}

fn plain_identity() -> ParsedIdentity {
    ParsedIdentity {
        identity: GameIdentity {
            is_encrypted: false,
            is_compressed: false,
            ..GameIdentity::default()
        },
        ..ParsedIdentity::default()
    }
}

#[test]
fn dump_command_line() {
    let tmp = tempfile::tempdir().unwrap();
    let image = tmp.path().join("out").join("game.iso");
    let runner = ScriptedRunner::new(|_, args, _| {
        std::fs::write(PathBuf::from(&args[2]), b"iso").unwrap();
        ok("")
    });
    let settings = settings();
    ExternalToolchain::new(&settings, &runner)
        .dump_disc("E:", &image)
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, PathBuf::from("DiscImageCreator"));
    assert_eq!(
        calls[0].1,
        vec!["dvd".to_string(), "E:".to_string(), image.to_string_lossy().into_owned(), "4".to_string()]
    );
}

#[test]
fn dump_without_image_is_no_output() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new(|_, _, _| ok(""));
    let settings = settings();
    let err = ExternalToolchain::new(&settings, &runner)
        .dump_disc("E:", &tmp.path().join("game.iso"))
        .unwrap_err();
    assert!(matches!(err, ToolError::NoOutput { .. }));
}

#[test]
fn extract_runs_in_output_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("extracted");
    let runner = ScriptedRunner::new(|_, _, _| ok(""));
    let settings = settings();
    ExternalToolchain::new(&settings, &runner)
        .extract_image(&tmp.path().join("game.iso"), &out)
        .unwrap();

    assert!(out.is_dir());
    let calls = runner.calls();
    assert_eq!(calls[0].0, PathBuf::from("extract-xiso"));
    assert_eq!(calls[0].1[0], "-x");
    assert!(Path::new(&calls[0].1[1]).is_absolute());
    assert_eq!(calls[0].2.as_deref(), Some(out.as_path()));
}

#[test]
fn extract_failure_carries_exit_code() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new(|_, _, _| {
        Ok(ToolOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "not an xiso".to_string(),
        })
    });
    let settings = settings();
    let err = ExternalToolchain::new(&settings, &runner)
        .extract_image(&tmp.path().join("game.iso"), &tmp.path().join("x"))
        .unwrap_err();
    match err {
        ToolError::Failed { code, stderr, .. } => {
            assert_eq!(code, Some(1));
            assert_eq!(stderr, "not an xiso");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn identity_text_combines_streams_and_tolerates_exit_code() {
    let runner = ScriptedRunner::new(|_, _, _| {
        Ok(ToolOutput {
            exit_code: Some(1),
            stdout: "Execution Id\n  Title Id: 4E4D07F5\n".to_string(),
            stderr: "warning: odd header".to_string(),
        })
    });
    let settings = settings();
    let text = ExternalToolchain::new(&settings, &runner)
        .identity_text(Path::new("default.xex"))
        .unwrap();
    assert!(text.contains("Title Id: 4E4D07F5"));
    assert!(text.contains("odd header"));
    assert_eq!(runner.calls()[0].1, vec!["-l".to_string(), "default.xex".to_string()]);
}

#[test]
fn identity_text_empty_failure_is_error() {
    let runner = ScriptedRunner::new(|_, _, _| {
        Ok(ToolOutput {
            exit_code: Some(2),
            ..ToolOutput::default()
        })
    });
    let settings = settings();
    assert!(
        ExternalToolchain::new(&settings, &runner)
            .identity_text(Path::new("default.xex"))
            .is_err()
    );
}

#[test]
fn analyse_skips_cleaning_and_converts_report() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("analysis");
    let runner = ScriptedRunner::new(|_, args, _| {
        std::fs::write(
            PathBuf::from(&args[1]),
            "[[switch]]\nbase = 0x82001000\nr = 11\n",
        )
        .unwrap();
        ok("")
    });
    let settings = settings();
    let result = ExternalToolchain::new(&settings, &runner)
        .analyse(Path::new("/games/default.xex"), &out, &plain_identity())
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 1, "no cleaning call expected");
    assert_eq!(calls[0].0, PathBuf::from("XenonAnalyse"));
    assert_eq!(calls[0].1[0], "/games/default.xex");

    assert_eq!(result.report_toml, out.join(REPORT_TOML));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&result.report_json).unwrap()).unwrap();
    assert_eq!(json["switch"][0]["r"], 11);
}

#[test]
fn analyse_cleans_encrypted_binary_first() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("analysis");
    let runner = ScriptedRunner::new(|tool, args, _| {
        if tool == Path::new("xextool") {
            // -e d -c u -o <clean> <src>
            std::fs::write(PathBuf::from(&args[5]), b"clean").unwrap();
        }
        ok("")
    });
    let identity = ParsedIdentity {
        identity: GameIdentity {
            is_encrypted: true,
            is_compressed: true,
            ..GameIdentity::default()
        },
        ..ParsedIdentity::default()
    };
    let settings = settings();
    ExternalToolchain::new(&settings, &runner)
        .analyse(Path::new("/games/default.xex"), &out, &identity)
        .unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    let clean_path = out.join("default_clean.xex").to_string_lossy().into_owned();
    assert_eq!(
        calls[0].1,
        vec!["-e", "d", "-c", "u", "-o", clean_path.as_str(), "/games/default.xex"]
    );
    assert_eq!(calls[1].1[0], clean_path);
}

#[test]
fn failed_cleaning_falls_back_to_original() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = ScriptedRunner::new(|tool, _, _| {
        if tool == Path::new("xextool") {
            Err(ToolError::Missing { tool: "xextool".to_string() })
        } else {
            ok("")
        }
    });
    let identity = ParsedIdentity::default();
    let settings = settings();
    let chain = ExternalToolchain::new(&settings, &runner);
    let cleaned = chain.clean_binary(Path::new("/games/default.xex"), tmp.path(), &identity);
    assert_eq!(cleaned, PathBuf::from("/games/default.xex"));
}

#[test]
fn empty_report_becomes_empty_object() {
    let tmp = tempfile::tempdir().unwrap();
    let toml_path = tmp.path().join(REPORT_TOML);
    let json_path = tmp.path().join(REPORT_JSON);
    std::fs::write(&toml_path, "").unwrap();
    report_to_json(&toml_path, &json_path).unwrap();
    assert_eq!(std::fs::read_to_string(&json_path).unwrap().trim(), "{}");
}

#[test]
fn default_xex_at_depth_beats_root_binary() {
    let tmp = tempfile::tempdir().unwrap();
    let nested = tmp.path().join("media").join("bin");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(tmp.path().join("other.xex"), b"").unwrap();
    std::fs::write(nested.join("default.xex"), b"").unwrap();

    assert_eq!(
        find_primary_binary(tmp.path()).unwrap(),
        Some(nested.join("default.xex"))
    );
}

#[test]
fn default_xex_matches_case_insensitively() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("aaa.xex"), b"").unwrap();
    std::fs::write(tmp.path().join("DEFAULT.XEX"), b"").unwrap();
    assert_eq!(
        find_primary_binary(tmp.path()).unwrap(),
        Some(tmp.path().join("DEFAULT.XEX"))
    );
}

#[test]
fn falls_back_to_first_sorted_binary() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("zeta.xex"), b"").unwrap();
    std::fs::write(tmp.path().join("alpha.XEX"), b"").unwrap();
    std::fs::write(tmp.path().join("readme.txt"), b"").unwrap();

    let all = list_binaries(tmp.path()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(
        find_primary_binary(tmp.path()).unwrap(),
        Some(tmp.path().join("alpha.XEX"))
    );
}

#[test]
fn no_binaries_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("game.iso"), b"").unwrap();
    assert_eq!(find_primary_binary(tmp.path()).unwrap(), None);
}
