//! The external conversion tools behind a trait.
//!
//! [`ExternalToolchain`] builds the command lines of the real programs;
//! tests substitute a scripted [`Toolchain`].

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use xex_porter_core::ParsedIdentity;

use crate::error::ToolError;
use crate::settings::{Settings, Tool};
use crate::tools::{ToolOutput, ToolRunner, tool_name};

/// Extension of Xbox 360 executables.
pub const BINARY_EXTENSION: &str = "xex";

/// Preferred primary binary name.
pub const PRIMARY_BINARY_NAME: &str = "default.xex";

pub const REPORT_TOML: &str = "analysis.toml";
pub const REPORT_JSON: &str = "analysis.json";

/// Files produced by the analysis stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutput {
    pub report_toml: PathBuf,
    pub report_json: PathBuf,
}

/// The operations the pipeline needs from the outside world.
pub trait Toolchain {
    /// Read the disc in `drive` into the image file `image`.
    fn dump_disc(&self, drive: &str, image: &Path) -> Result<(), ToolError>;

    /// Unpack `image` into the (existing, empty) directory `out_dir`.
    fn extract_image(&self, image: &Path, out_dir: &Path) -> Result<(), ToolError>;

    /// Human-readable identity report of a binary.
    fn identity_text(&self, binary: &Path) -> Result<String, ToolError>;

    /// Run static analysis of `binary`, writing reports into `out_dir`.
    fn analyse(
        &self,
        binary: &Path,
        out_dir: &Path,
        identity: &ParsedIdentity,
    ) -> Result<AnalysisOutput, ToolError>;
}

// ── External tools ──────────────────────────────────────────────────────────

/// [`Toolchain`] that shells out to DiscImageCreator, extract-xiso, xextool
/// and XenonAnalyse.
pub struct ExternalToolchain<'a> {
    settings: &'a Settings,
    runner: &'a dyn ToolRunner,
}

impl<'a> ExternalToolchain<'a> {
    pub fn new(settings: &'a Settings, runner: &'a dyn ToolRunner) -> Self {
        Self { settings, runner }
    }

    fn run(
        &self,
        tool: Tool,
        args: Vec<OsString>,
        cwd: Option<&Path>,
        timeout: std::time::Duration,
    ) -> Result<ToolOutput, ToolError> {
        let program = self.settings.tool(tool);
        self.runner.invoke(&program, &args, cwd, timeout)
    }

    /// Decrypt and decompress `binary` into `out_dir` when its identity says
    /// it needs it. Falls back to the original on any failure.
    pub fn clean_binary(&self, binary: &Path, out_dir: &Path, identity: &ParsedIdentity) -> PathBuf {
        let decrypt = identity.identity.is_encrypted;
        let decompress = identity.identity.is_compressed;
        if !decrypt && !decompress {
            log::debug!("{} needs no cleaning", binary.display());
            return binary.to_path_buf();
        }

        let stem = binary
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "binary".to_string());
        let cleaned = out_dir.join(format!("{}_clean.{}", stem, BINARY_EXTENSION));

        let mut args: Vec<OsString> = Vec::new();
        if decrypt {
            args.extend(["-e".into(), "d".into()]);
        }
        if decompress {
            args.extend(["-c".into(), "u".into()]);
        }
        args.extend(["-o".into(), cleaned.clone().into_os_string(), binary.into()]);

        if let Err(e) = std::fs::create_dir_all(out_dir) {
            log::warn!("Could not create {}: {}; using the original binary", out_dir.display(), e);
            return binary.to_path_buf();
        }
        let result = self
            .run(Tool::XexTool, args, None, self.settings.timeouts.clean())
            .and_then(|out| out.check(&self.settings.tool(Tool::XexTool)));
        match result {
            Ok(_) if cleaned.is_file() => {
                log::info!("Cleaned binary written to {}", cleaned.display());
                cleaned
            }
            Ok(_) => {
                log::warn!("Cleaning produced no file; using the original binary");
                binary.to_path_buf()
            }
            Err(e) => {
                log::warn!("Cleaning failed ({}); using the original binary", e);
                binary.to_path_buf()
            }
        }
    }

    /// Ask the recompiler to check a build configuration.
    pub fn validate_build_config(&self, config: &Path) -> Result<ToolOutput, ToolError> {
        let args = vec![
            config.as_os_str().to_owned(),
            self.settings.tool(Tool::PpcContext).into_os_string(),
        ];
        self.run(Tool::XenonRecomp, args, config.parent(), self.settings.timeouts.analyse())
    }
}

impl Toolchain for ExternalToolchain<'_> {
    fn dump_disc(&self, drive: &str, image: &Path) -> Result<(), ToolError> {
        if let Some(parent) = image.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let args = vec![
            "dvd".into(),
            drive.into(),
            image.as_os_str().to_owned(),
            "4".into(),
        ];
        let program = self.settings.tool(Tool::DiscImageCreator);
        self.run(Tool::DiscImageCreator, args, None, self.settings.timeouts.dump())?
            .check(&program)?;
        if !image.is_file() {
            return Err(ToolError::NoOutput {
                tool: tool_name(&program),
                path: image.to_path_buf(),
            });
        }
        Ok(())
    }

    fn extract_image(&self, image: &Path, out_dir: &Path) -> Result<(), ToolError> {
        std::fs::create_dir_all(out_dir)?;
        // The tool unpacks into its working directory.
        let image = absolute(image);
        let args = vec!["-x".into(), image.into_os_string()];
        let program = self.settings.tool(Tool::ExtractXiso);
        self.run(Tool::ExtractXiso, args, Some(out_dir), self.settings.timeouts.extract())?
            .check(&program)?;
        Ok(())
    }

    fn identity_text(&self, binary: &Path) -> Result<String, ToolError> {
        let args = vec!["-l".into(), binary.as_os_str().to_owned()];
        let program = self.settings.tool(Tool::XexTool);
        let out = self.run(Tool::XexTool, args, None, self.settings.timeouts.clean())?;
        let text = out.combined();
        // xextool exits non-zero on some valid images; only empty output is fatal.
        if text.trim().is_empty() && !out.success() {
            return Err(ToolError::Failed {
                tool: tool_name(&program),
                code: out.exit_code,
                stderr: out.stderr,
            });
        }
        Ok(text)
    }

    fn analyse(
        &self,
        binary: &Path,
        out_dir: &Path,
        identity: &ParsedIdentity,
    ) -> Result<AnalysisOutput, ToolError> {
        std::fs::create_dir_all(out_dir)?;
        let cleaned = self.clean_binary(binary, out_dir, identity);

        let report_toml = out_dir.join(REPORT_TOML);
        let report_json = out_dir.join(REPORT_JSON);
        if !report_toml.exists() {
            std::fs::write(&report_toml, b"")?;
        }

        let args = vec![
            cleaned.into_os_string(),
            report_toml.as_os_str().to_owned(),
        ];
        let program = self.settings.tool(Tool::XenonAnalyse);
        self.run(Tool::XenonAnalyse, args, None, self.settings.timeouts.analyse())?
            .check(&program)?;

        report_to_json(&report_toml, &report_json)?;
        Ok(AnalysisOutput {
            report_toml,
            report_json,
        })
    }
}

/// Convert the analyser's TOML report into JSON.
///
/// An empty or unparseable report becomes `{}`.
pub fn report_to_json(report_toml: &Path, report_json: &Path) -> io::Result<()> {
    let text = std::fs::read_to_string(report_toml).unwrap_or_default();
    let value: toml::Value = if text.trim().is_empty() {
        toml::Value::Table(Default::default())
    } else {
        text.parse().unwrap_or_else(|e| {
            log::warn!("Could not parse {}: {}", report_toml.display(), e);
            toml::Value::Table(Default::default())
        })
    };
    let json = serde_json::to_string_pretty(&value).map_err(io::Error::other)?;
    std::fs::write(report_json, json)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

// ── Binary discovery ────────────────────────────────────────────────────────

/// Every `*.xex` under `dir` (any depth, case-insensitive), in sorted path order.
pub fn list_binaries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect_binaries(dir, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect_binaries(dir: &Path, found: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_binaries(&path, found)?;
        } else if path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(BINARY_EXTENSION))
        {
            found.push(path);
        }
    }
    Ok(())
}

/// The title's main executable under `dir`.
///
/// A `default.xex` at any depth wins over every other binary; otherwise the
/// first binary in sorted order. `None` when there are no binaries.
pub fn find_primary_binary(dir: &Path) -> io::Result<Option<PathBuf>> {
    let binaries = list_binaries(dir)?;
    let preferred = binaries.iter().find(|p| {
        p.file_name()
            .is_some_and(|n| n.to_string_lossy().eq_ignore_ascii_case(PRIMARY_BINARY_NAME))
    });
    Ok(preferred.or_else(|| binaries.first()).cloned())
}

#[cfg(test)]
#[path = "tests/toolchain_tests.rs"]
mod tests;
