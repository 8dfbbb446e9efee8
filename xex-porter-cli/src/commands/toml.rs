use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xex_porter_lib::{BuildConfig, ExternalToolchain, SystemToolRunner};

use crate::CliError;

use super::load_settings;

/// Entry point for `toml`: write a build configuration without running the
/// rest of the pipeline.
pub(crate) fn run_toml(
    config: Option<PathBuf>,
    xex: &Path,
    report: Option<PathBuf>,
    output: Option<PathBuf>,
    validate: bool,
) -> Result<(), CliError> {
    if !xex.is_file() {
        return Err(CliError::not_found(format!("binary {}", xex.display())));
    }
    if let Some(report) = &report {
        if !report.is_file() {
            log::warn!("Analysis report {} does not exist yet", report.display());
        }
    }

    let out_dir = output.unwrap_or_else(|| {
        xex.parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let path = BuildConfig::new(xex, report).write_to_dir(&out_dir)?;
    log::info!(
        "{} {}",
        "Wrote".if_supports_color(Stdout, |t| t.green()),
        path.display()
    );

    if validate {
        let settings = load_settings(config)?;
        let runner = SystemToolRunner;
        let output = ExternalToolchain::new(&settings, &runner)
            .validate_build_config(&path)
            .map_err(|e| CliError::tool(e.to_string()))?;
        if output.success() {
            log::info!(
                "{}",
                "Recompiler accepted the configuration.".if_supports_color(Stdout, |t| t.green()),
            );
        } else {
            for line in output.combined().lines() {
                log::info!("  {}", line);
            }
            return Err(CliError::tool("recompiler rejected the configuration"));
        }
    }
    Ok(())
}
