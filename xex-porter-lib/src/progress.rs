//! Pipeline progress reporting.

use crate::pipeline::Stage;

/// Receives progress updates from a pipeline run. Observability only: a
/// sink cannot influence the run.
pub trait PipelineProgress {
    /// A stage is about to run; `detail` names its input.
    fn on_stage_start(&self, stage: Stage, detail: &str);

    /// A stage finished; `detail` names its main output.
    fn on_stage_complete(&self, stage: Stage, detail: &str);

    /// Free-form status line (selected binary, detected title, ...).
    fn on_message(&self, message: &str);
}

/// A no-op progress reporter that discards all updates.
pub struct SilentProgress;

impl PipelineProgress for SilentProgress {
    fn on_stage_start(&self, _stage: Stage, _detail: &str) {}
    fn on_stage_complete(&self, _stage: Stage, _detail: &str) {}
    fn on_message(&self, _message: &str) {}
}

/// A progress reporter that logs to the `log` crate.
pub struct LogProgress;

impl PipelineProgress for LogProgress {
    fn on_stage_start(&self, stage: Stage, detail: &str) {
        log::info!("[{}] {}", stage, detail);
    }

    fn on_stage_complete(&self, stage: Stage, detail: &str) {
        log::info!("[{}] done: {}", stage, detail);
    }

    fn on_message(&self, message: &str) {
        log::info!("{}", message);
    }
}
