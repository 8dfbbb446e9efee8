//! Spinner display for pipeline stages.
//!
//! One spinner line shows the running stage; finished stages are printed
//! above it through the logger.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xex_porter_lib::{PipelineProgress, Stage};

/// [`PipelineProgress`] that drives a single terminal spinner.
pub(crate) struct StageSpinner {
    bar: ProgressBar,
}

impl StageSpinner {
    /// When `quiet` is true the spinner is hidden.
    pub(crate) fn new(quiet: bool) -> Self {
        let bar = ProgressBar::new_spinner();
        if quiet {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        if let Ok(style) = ProgressStyle::with_template("  {spinner:.cyan} {msg} {elapsed:.dim}") {
            bar.set_style(style.tick_chars("/-\\|"));
        }
        Self { bar }
    }

    pub(crate) fn finish(&self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

impl PipelineProgress for StageSpinner {
    fn on_stage_start(&self, stage: Stage, detail: &str) {
        self.bar.reset_elapsed();
        self.bar.set_message(format!("{}: {}", stage, detail));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        self.bar.disable_steady_tick();
        self.bar.set_message("");
        self.bar.suspend(|| {
            log::info!(
                "  {} {:<10} {}",
                "\u{2713}".if_supports_color(Stdout, |t| t.green()),
                stage,
                detail.if_supports_color(Stdout, |t| t.dimmed()),
            );
        });
    }

    fn on_message(&self, message: &str) {
        self.bar.suspend(|| log::info!("    {}", message));
    }
}
