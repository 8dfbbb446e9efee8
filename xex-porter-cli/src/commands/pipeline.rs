use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xex_porter_lib::{
    ExternalToolchain, Pipeline, PipelineRequest, PipelineRun, Stage, SystemToolRunner,
};

use crate::CliError;
use crate::spinner::StageSpinner;

use super::{load_settings, open_catalog};

/// Entry point for `pipeline`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_pipeline(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    drive: Option<String>,
    iso: Option<PathBuf>,
    xex: Option<PathBuf>,
    output: Option<PathBuf>,
    no_catalog: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let conn = if no_catalog {
        None
    } else {
        Some(open_catalog(&settings, db)?)
    };

    let request = PipelineRequest {
        drive,
        disc_image: iso,
        binary: xex,
        output_dir: output,
    };

    let runner = SystemToolRunner;
    let toolchain = ExternalToolchain::new(&settings, &runner);
    let spinner = StageSpinner::new(quiet);

    let mut pipeline = Pipeline::new(&settings, &toolchain).with_progress(&spinner);
    if let Some(conn) = &conn {
        pipeline = pipeline.with_catalog(conn);
    }

    log::info!(
        "{}",
        "Running pipeline".if_supports_color(Stdout, |t| t.bold()),
    );
    let run = pipeline.run(&request);
    spinner.finish();

    print_summary(&run);

    match run.error {
        Some(e) => Err(CliError::pipeline(e.to_string())),
        None => Ok(()),
    }
}

fn print_summary(run: &PipelineRun) {
    crate::log_blank();
    let steps: Vec<&str> = run.steps_completed.iter().map(Stage::as_str).collect();
    if steps.is_empty() {
        log::info!("  Steps completed: none");
    } else {
        log::info!("  Steps completed: {}", steps.join(" -> "));
    }

    let artifacts = &run.artifacts;
    let rows = [
        ("Disc image", &artifacts.disc_image),
        ("Extracted", &artifacts.extracted_dir),
        ("Binary", &artifacts.primary_binary),
        ("Analysis", &artifacts.analysis_json),
        ("Build config", &artifacts.build_config),
    ];
    for (label, path) in rows {
        if let Some(path) = path {
            log::info!(
                "  {} {}",
                format!("{:<14}", format!("{}:", label)).if_supports_color(Stdout, |t| t.cyan()),
                path.display()
            );
        }
    }

    if let Some(identity) = &run.identity {
        if let Some(tid) = identity.title_id() {
            log::info!(
                "  {} {} {}",
                format!("{:<14}", "Title:").if_supports_color(Stdout, |t| t.cyan()),
                tid.if_supports_color(Stdout, |t| t.bold()),
                identity.identity.display_name()
            );
        }
    }
    if let Some(profile) = &run.profile {
        log::info!(
            "  {} {}",
            format!("{:<14}", "Profile:").if_supports_color(Stdout, |t| t.cyan()),
            profile.label()
        );
    }
    if let Some(id) = run.catalog_id {
        log::info!(
            "  {} {}",
            format!("{:<14}", "Catalog id:").if_supports_color(Stdout, |t| t.cyan()),
            id
        );
    }
    if let Some(workspace) = &run.workspace {
        log::info!(
            "  {} {}",
            format!("{:<14}", "Workspace:").if_supports_color(Stdout, |t| t.cyan()),
            workspace.root().display()
        );
    }

    crate::log_blank();
    if run.success {
        log::info!(
            "{}",
            "Pipeline finished.".if_supports_color(Stdout, |t| t.green()),
        );
    }
}
