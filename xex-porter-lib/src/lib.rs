//! Conversion pipeline, per-title workspaces, external tool plumbing and
//! settings for xex-porter.

pub mod build_config;
pub mod error;
pub mod pipeline;
pub mod profiles;
pub mod progress;
pub mod settings;
pub mod toolchain;
pub mod tools;
pub mod workspace;

pub use build_config::{BuildConfig, update_special_addresses};
pub use error::{PersistError, PipelineError, ProfileError, SettingsError, ToolError};
pub use pipeline::{Artifacts, Pipeline, PipelineRequest, PipelineRun, Stage};
pub use profiles::{GameProfile, ProfileManager, RecompSettings};
pub use progress::{LogProgress, PipelineProgress, SilentProgress};
pub use settings::{SettingSource, Settings, Tool};
pub use toolchain::{AnalysisOutput, ExternalToolchain, Toolchain, find_primary_binary};
pub use tools::{SystemToolRunner, ToolOutput, ToolRunner};
pub use workspace::{
    ExternalFile, GameInfo, SyncFailure, SyncReport, Workspace, WorkspaceManager,
};
