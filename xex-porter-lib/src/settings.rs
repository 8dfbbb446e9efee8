//! Application settings: external tool paths, working directories and
//! per-stage timeouts.
//!
//! The settings file is `~/.config/xex-porter/settings.toml`. Each tool
//! path resolves with the priority settings file > environment variable >
//! bare executable name (looked up on `PATH`).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Environment variable overriding the default temp directory.
pub const TEMP_BASE_ENV: &str = "X360_TEMP_BASE";

/// Canonical path to the settings file: `~/.config/xex-porter/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("xex-porter").join("settings.toml")
}

/// Default catalog location: `<data dir>/xex-porter/games.db`.
pub fn default_database_path() -> PathBuf {
    let data = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    data.join("xex-porter").join("games.db")
}

/// Default root for per-title workspaces: `~/XexPorter/ports`.
pub fn default_ports_root() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join("XexPorter").join("ports")
}

/// Default directory of per-title profiles: `~/.config/xex-porter/profiles`.
pub fn default_profiles_dir() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("xex-porter").join("profiles")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("xex-porter")
}

// ── Tools ───────────────────────────────────────────────────────────────────

/// External programs (and the one support header) the toolchain needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tool {
    XexTool,
    XenonAnalyse,
    ExtractXiso,
    DiscImageCreator,
    XenonRecomp,
    PpcContext,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Self::XexTool,
        Self::XenonAnalyse,
        Self::ExtractXiso,
        Self::DiscImageCreator,
        Self::XenonRecomp,
        Self::PpcContext,
    ];

    /// Key under `[tools]` in `settings.toml`.
    pub fn key(&self) -> &'static str {
        match self {
            Self::XexTool => "xextool",
            Self::XenonAnalyse => "xenon_analyse",
            Self::ExtractXiso => "extract_xiso",
            Self::DiscImageCreator => "disc_image_creator",
            Self::XenonRecomp => "xenon_recomp",
            Self::PpcContext => "ppc_context",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            Self::XexTool => "XEXTOOL_PATH",
            Self::XenonAnalyse => "XENON_ANALYSE_PATH",
            Self::ExtractXiso => "EXTRACT_XISO_PATH",
            Self::DiscImageCreator => "DISC_IMAGE_CREATOR_PATH",
            Self::XenonRecomp => "XENON_RECOMP_PATH",
            Self::PpcContext => "PPC_CONTEXT_PATH",
        }
    }

    /// Fallback when neither the file nor the environment names a path.
    pub fn default_program(&self) -> &'static str {
        match self {
            Self::XexTool => "xextool",
            Self::XenonAnalyse => "XenonAnalyse",
            Self::ExtractXiso => "extract-xiso",
            Self::DiscImageCreator => "DiscImageCreator",
            Self::XenonRecomp => "XenonRecomp",
            Self::PpcContext => "ppc_context.h",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_program())
    }
}

/// Where a setting's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    ConfigFile,
    EnvVar(&'static str),
    Default,
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigFile => write!(f, "config file"),
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSetting {
    pub path: PathBuf,
    pub source: SettingSource,
}

// ── Settings ────────────────────────────────────────────────────────────────

/// Per-stage subprocess timeouts, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub dump: u64,
    pub extract: u64,
    pub analyse: u64,
    pub clean: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            dump: 3 * 60 * 60,
            extract: 30 * 60,
            analyse: 30 * 60,
            clean: 10 * 60,
        }
    }
}

impl Timeouts {
    pub fn dump(&self) -> Duration {
        Duration::from_secs(self.dump)
    }

    pub fn extract(&self) -> Duration {
        Duration::from_secs(self.extract)
    }

    pub fn analyse(&self) -> Duration {
        Duration::from_secs(self.analyse)
    }

    pub fn clean(&self) -> Duration {
        Duration::from_secs(self.clean)
    }
}

/// Fully resolved settings. Passed explicitly to whatever needs them; there
/// is no global instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub tools: BTreeMap<Tool, ToolSetting>,
    pub temp_dir: PathBuf,
    pub ports_root: PathBuf,
    pub database: PathBuf,
    /// One `<TITLEID>.toml` per title plus an optional `_default.toml`.
    pub profiles_dir: PathBuf,
    pub timeouts: Timeouts,
    /// Compare SHA-1 digests after copying files into a workspace.
    pub verify_content: bool,
    /// The file these settings were read from, if any.
    pub file: Option<PathBuf>,
}

/// On-disk shape of `settings.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    tools: BTreeMap<String, String>,
    paths: PathsSection,
    timeouts: Option<Timeouts>,
    workspace: WorkspaceSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PathsSection {
    temp_dir: Option<PathBuf>,
    ports_root: Option<PathBuf>,
    database: Option<PathBuf>,
    profiles_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WorkspaceSection {
    verify_content: Option<bool>,
}

impl Settings {
    /// Load from the canonical settings file and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&settings_path())
    }

    /// Load from `path` and the process environment. A missing file yields
    /// environment-and-default settings.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        Self::load_with_env(path, |var| std::env::var(var).ok())
    }

    /// Load from `path`, resolving environment variables through `env`.
    pub fn load_with_env(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let file = match std::fs::read_to_string(path) {
            Ok(contents) => Some(toml::from_str::<SettingsFile>(&contents).map_err(|source| {
                SettingsError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut settings = Self::resolve(file.unwrap_or_default(), env);
        settings.file = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Settings from the environment and built-in defaults only.
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        Self::resolve(SettingsFile::default(), env)
    }

    /// Re-read the file these settings came from into a fresh value.
    pub fn reload(&self) -> Result<Self, SettingsError> {
        match &self.file {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    fn resolve(file: SettingsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty_env = |var: &str| env(var).filter(|v| !v.trim().is_empty());

        let tools = Tool::ALL
            .iter()
            .map(|tool| {
                let from_file = file
                    .tools
                    .get(tool.key())
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| ToolSetting {
                        path: PathBuf::from(v),
                        source: SettingSource::ConfigFile,
                    });
                let setting = from_file
                    .or_else(|| {
                        non_empty_env(tool.env_var()).map(|v| ToolSetting {
                            path: PathBuf::from(v),
                            source: SettingSource::EnvVar(tool.env_var()),
                        })
                    })
                    .unwrap_or_else(|| ToolSetting {
                        path: PathBuf::from(tool.default_program()),
                        source: SettingSource::Default,
                    });
                (*tool, setting)
            })
            .collect();

        let temp_dir = file
            .paths
            .temp_dir
            .or_else(|| non_empty_env(TEMP_BASE_ENV).map(PathBuf::from))
            .unwrap_or_else(default_temp_dir);

        Self {
            tools,
            temp_dir,
            ports_root: file.paths.ports_root.unwrap_or_else(default_ports_root),
            database: file.paths.database.unwrap_or_else(default_database_path),
            profiles_dir: file.paths.profiles_dir.unwrap_or_else(default_profiles_dir),
            timeouts: file.timeouts.unwrap_or_default(),
            verify_content: file.workspace.verify_content.unwrap_or(false),
            file: None,
        }
    }

    /// Resolved path of `tool`.
    pub fn tool(&self, tool: Tool) -> PathBuf {
        self.tools
            .get(&tool)
            .map(|t| t.path.clone())
            .unwrap_or_else(|| PathBuf::from(tool.default_program()))
    }

    pub fn tool_source(&self, tool: Tool) -> SettingSource {
        self.tools
            .get(&tool)
            .map(|t| t.source)
            .unwrap_or(SettingSource::Default)
    }

    /// Default pipeline output directory.
    pub fn pipeline_output_dir(&self) -> PathBuf {
        self.temp_dir.join("pipeline_output")
    }

    /// Write these settings into `path`.
    ///
    /// Uses `toml::Value` for a surgical update so keys this program does not
    /// know about are preserved. Tool paths that only came from the
    /// environment or defaults are not persisted. The write is atomic.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut doc: toml::Value = match std::fs::read_to_string(path) {
            Ok(contents) => contents
                .parse()
                .unwrap_or_else(|_| toml::Value::Table(Default::default())),
            Err(_) => toml::Value::Table(Default::default()),
        };
        let root = doc.as_table_mut().ok_or(SettingsError::NotATable)?;

        let tools = section(root, "tools")?;
        for (tool, setting) in &self.tools {
            if setting.source == SettingSource::ConfigFile {
                tools.insert(tool.key().to_string(), path_value(&setting.path));
            }
        }

        let paths = section(root, "paths")?;
        paths.insert("temp_dir".to_string(), path_value(&self.temp_dir));
        paths.insert("ports_root".to_string(), path_value(&self.ports_root));
        paths.insert("database".to_string(), path_value(&self.database));
        paths.insert("profiles_dir".to_string(), path_value(&self.profiles_dir));

        root.insert("timeouts".to_string(), toml::Value::try_from(self.timeouts)?);

        let workspace = section(root, "workspace")?;
        workspace.insert("verify_content".to_string(), toml::Value::Boolean(self.verify_content));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let serialized = toml::to_string_pretty(&doc)?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &serialized).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;

        Ok(())
    }

    /// Record `path` as the configured location of `tool`.
    pub fn set_tool(&mut self, tool: Tool, path: impl Into<PathBuf>) {
        self.tools.insert(
            tool,
            ToolSetting {
                path: path.into(),
                source: SettingSource::ConfigFile,
            },
        );
    }
}

fn section<'a>(
    root: &'a mut toml::map::Map<String, toml::Value>,
    name: &str,
) -> Result<&'a mut toml::map::Map<String, toml::Value>, SettingsError> {
    root.entry(name)
        .or_insert_with(|| toml::Value::Table(Default::default()))
        .as_table_mut()
        .ok_or(SettingsError::NotATable)
}

fn path_value(path: &Path) -> toml::Value {
    toml::Value::String(path.to_string_lossy().into_owned())
}

/// Load the settings file as a pretty-printed TOML string for display.
pub fn load_settings_string(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    toml::to_string_pretty(&doc).ok()
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
