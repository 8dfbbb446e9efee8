//! Per-title game profiles.
//!
//! A profile is a TOML file named after the title id (`4D5307E6.toml`) in
//! the profiles directory. It overrides recompiler settings for one title,
//! records named patch switches, and adds custom keys to the generated
//! build configuration. `_default.toml`, when present, stands in for titles
//! that have no profile of their own.
//!
//! ```toml
//! [profile]
//! title_id = "4D5307E6"
//! game_name = "Halo 3"
//!
//! [recomp]
//! skip_lr = true
//! patch_file = "halo3_patches.toml"
//!
//! [recomp.addresses]
//! restgprlr_14 = 0x82A1B2C0
//!
//! [patches]
//! skip_intro = true
//!
//! [custom]
//! generate_exception_handlers = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::build_config::{
    BuildConfig, FunctionHint, InvalidInstruction, MidAsmHook, SPECIAL_ADDRESSES,
};
use crate::error::ProfileError;

/// File consulted when a title has no profile.
pub const DEFAULT_PROFILE_FILE: &str = "_default.toml";

/// Title id reported by the fallback profile.
pub const DEFAULT_TITLE_ID: &str = "00000000";

const PROFILE_EXTENSION: &str = "toml";

/// Upper-case, trimmed title id, or an error if it could not name a file.
pub fn normalize_title_id(title_id: &str) -> Result<String, ProfileError> {
    let tid = title_id.trim().to_ascii_uppercase();
    if tid.is_empty() || !tid.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ProfileError::InvalidTitleId(title_id.to_string()));
    }
    Ok(tid)
}

// ── Profile ─────────────────────────────────────────────────────────────────

/// The `[recomp]` section. Anything left unset keeps the generated value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecompSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_lr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_msr: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctr_as_local: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xer_as_local: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_as_local: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cr_as_local: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_argument_as_local: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_volatile_as_local: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_directory: Option<String>,
    /// Relative paths resolve against the directory holding the profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_file: Option<PathBuf>,

    /// Keyed by the bare names in [`SPECIAL_ADDRESSES`].
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub addresses: BTreeMap<String, u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionHint>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub invalid_instructions: Vec<InvalidInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub midasm_hooks: Vec<MidAsmHook>,
}

impl RecompSettings {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set toggles as `(key, value)` pairs, for display.
    pub fn toggle_overrides(&self) -> Vec<(&'static str, bool)> {
        let all = [
            ("skip_lr", self.skip_lr),
            ("skip_msr", self.skip_msr),
            ("ctr_as_local", self.ctr_as_local),
            ("xer_as_local", self.xer_as_local),
            ("reserved_as_local", self.reserved_as_local),
            ("cr_as_local", self.cr_as_local),
            ("non_argument_as_local", self.non_argument_as_local),
            ("non_volatile_as_local", self.non_volatile_as_local),
        ];
        all.into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect()
    }

    fn apply(&self, config: &mut BuildConfig, base_dir: Option<&Path>) {
        let toggles = &mut config.toggles;
        let slots = [
            (self.skip_lr, &mut toggles.skip_lr),
            (self.skip_msr, &mut toggles.skip_msr),
            (self.ctr_as_local, &mut toggles.ctr_as_local),
            (self.xer_as_local, &mut toggles.xer_as_local),
            (self.reserved_as_local, &mut toggles.reserved_as_local),
            (self.cr_as_local, &mut toggles.cr_as_local),
            (self.non_argument_as_local, &mut toggles.non_argument_as_local),
            (self.non_volatile_as_local, &mut toggles.non_volatile_as_local),
        ];
        for (value, slot) in slots {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if let Some(dir) = &self.out_directory {
            config.out_directory = dir.clone();
        }
        if let Some(patch) = &self.patch_file {
            let resolved = match base_dir {
                Some(base) if patch.is_relative() => base.join(patch),
                _ => patch.clone(),
            };
            config.patch_file = Some(resolved);
        }

        for (name, addr) in &self.addresses {
            let bare = name.strip_suffix("_address").unwrap_or(name);
            if SPECIAL_ADDRESSES.contains(&bare) {
                config.addresses.insert(bare.to_string(), *addr);
            } else {
                log::warn!("Ignoring unknown special address '{}' in profile", name);
            }
        }

        config.functions.extend(self.functions.iter().copied());
        for instr in &self.invalid_instructions {
            if !config.invalid_instructions.contains(instr) {
                config.invalid_instructions.push(*instr);
            }
        }
        config.midasm_hooks.extend(self.midasm_hooks.iter().cloned());
    }
}

/// Settings for one title.
#[derive(Debug, Clone, PartialEq)]
pub struct GameProfile {
    pub title_id: String,
    pub game_name: String,
    pub description: String,
    pub recomp: RecompSettings,
    /// Named fixes and whether each is switched on.
    pub patches: BTreeMap<String, bool>,
    /// Extra build-configuration keys.
    pub custom: BTreeMap<String, toml::Value>,
    /// File the profile was read from or written to.
    pub source: Option<PathBuf>,
}

impl GameProfile {
    pub fn new(title_id: impl Into<String>, game_name: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            game_name: game_name.into(),
            description: String::new(),
            recomp: RecompSettings::default(),
            patches: BTreeMap::new(),
            custom: BTreeMap::new(),
            source: None,
        }
    }

    /// The empty profile used when neither a title profile nor
    /// `_default.toml` exists.
    pub fn builtin_default() -> Self {
        let mut profile = Self::new(DEFAULT_TITLE_ID, "Default");
        profile.description = "Built-in defaults".to_string();
        profile
    }

    /// Read a profile file.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ProfileFile = toml::from_str(&contents).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            title_id: file.profile.title_id,
            game_name: file.profile.game_name,
            description: file.profile.description,
            recomp: file.recomp,
            patches: file.patches,
            custom: file.custom,
            source: Some(path.to_path_buf()),
        })
    }

    /// Write the profile to `path`, creating its directory.
    pub fn save(&self, path: &Path) -> Result<(), ProfileError> {
        let io_err = |source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = ProfileFile {
            profile: ProfileHeader {
                title_id: self.title_id.clone(),
                game_name: self.game_name.clone(),
                description: self.description.clone(),
            },
            recomp: self.recomp.clone(),
            patches: self.patches.clone(),
            custom: self.custom.clone(),
        };
        let text = toml::to_string_pretty(&file)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text).map_err(io_err)
    }

    /// `Halo 3 [4D5307E6]`
    pub fn label(&self) -> String {
        format!("{} [{}]", self.game_name, self.title_id)
    }

    /// Names of the patches switched on.
    pub fn enabled_patches(&self) -> impl Iterator<Item = &str> {
        self.patches
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.as_str())
    }

    /// Merge this profile into `config`. Custom keys that the generated
    /// configuration already writes are skipped with a warning.
    pub fn apply_to(&self, config: &mut BuildConfig) {
        let base_dir = self.source.as_deref().and_then(Path::parent);
        self.recomp.apply(config, base_dir);

        for (key, value) in &self.custom {
            if BuildConfig::is_generated_key(key) {
                log::warn!(
                    "Profile {} sets generated key '{}'; use [recomp] instead",
                    self.title_id,
                    key
                );
                continue;
            }
            config.custom.insert(key.clone(), value.clone());
        }
        config.profile = Some(self.label());
    }
}

/// On-disk shape of a profile.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct ProfileFile {
    profile: ProfileHeader,
    #[serde(skip_serializing_if = "RecompSettings::is_empty")]
    recomp: RecompSettings,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    patches: BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    custom: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct ProfileHeader {
    title_id: String,
    game_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
}

impl Default for ProfileHeader {
    fn default() -> Self {
        Self {
            title_id: String::new(),
            game_name: "Unknown".to_string(),
            description: String::new(),
        }
    }
}

// ── Manager ─────────────────────────────────────────────────────────────────

/// Looks up profiles in one directory.
#[derive(Debug, Clone)]
pub struct ProfileManager {
    dir: PathBuf,
}

impl ProfileManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<TITLEID>.toml`
    pub fn profile_path(&self, title_id: &str) -> Result<PathBuf, ProfileError> {
        let tid = normalize_title_id(title_id)?;
        Ok(self.dir.join(format!("{}.{}", tid, PROFILE_EXTENSION)))
    }

    /// The profile for `title_id`, or `None` if there is no file for it.
    pub fn load_profile(&self, title_id: &str) -> Result<Option<GameProfile>, ProfileError> {
        let path = self.profile_path(title_id)?;
        if !path.is_file() {
            log::debug!("No profile at {}", path.display());
            return Ok(None);
        }
        let mut profile = GameProfile::load(&path)?;
        if profile.title_id.is_empty() {
            profile.title_id = normalize_title_id(title_id)?;
        }
        Ok(Some(profile))
    }

    /// `_default.toml`, or the built-in default when it is missing or
    /// unreadable.
    pub fn default_profile(&self) -> GameProfile {
        let path = self.dir.join(DEFAULT_PROFILE_FILE);
        if !path.is_file() {
            return GameProfile::builtin_default();
        }
        match GameProfile::load(&path) {
            Ok(mut profile) => {
                if profile.title_id.is_empty() {
                    profile.title_id = DEFAULT_TITLE_ID.to_string();
                }
                profile
            }
            Err(e) => {
                log::warn!("{}; using built-in defaults", e);
                GameProfile::builtin_default()
            }
        }
    }

    /// The title's own profile, falling back to [`default_profile`]. A
    /// broken title profile is reported and skipped.
    ///
    /// [`default_profile`]: ProfileManager::default_profile
    pub fn get_profile_or_default(&self, title_id: &str) -> GameProfile {
        match self.load_profile(title_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => self.default_profile(),
            Err(e) => {
                log::warn!("{}; using the default profile", e);
                self.default_profile()
            }
        }
    }

    /// Every title profile in the directory, sorted by game name. Files
    /// starting with `_` are not title profiles; unparsable files are
    /// skipped with a warning.
    pub fn list_profiles(&self) -> Result<Vec<GameProfile>, ProfileError> {
        let io_err = |source| ProfileError::Io {
            path: self.dir.clone(),
            source,
        };
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut profiles = Vec::new();
        for entry in entries {
            let path = entry.map_err(io_err)?.path();
            let is_profile = path.is_file()
                && path.extension().is_some_and(|e| e == PROFILE_EXTENSION)
                && path
                    .file_name()
                    .is_some_and(|n| !n.to_string_lossy().starts_with('_'));
            if !is_profile {
                continue;
            }
            match GameProfile::load(&path) {
                Ok(mut profile) => {
                    if profile.title_id.is_empty() {
                        if let Some(stem) = path.file_stem() {
                            profile.title_id = stem.to_string_lossy().to_ascii_uppercase();
                        }
                    }
                    profiles.push(profile);
                }
                Err(e) => log::warn!("Skipping {}", e),
            }
        }
        profiles.sort_by(|a, b| {
            a.game_name
                .cmp(&b.game_name)
                .then_with(|| a.title_id.cmp(&b.title_id))
        });
        Ok(profiles)
    }

    /// Write a new, empty profile for `title_id`. An existing file is only
    /// replaced when `overwrite` is set.
    pub fn create_profile(
        &self,
        title_id: &str,
        game_name: &str,
        description: &str,
        overwrite: bool,
    ) -> Result<GameProfile, ProfileError> {
        let tid = normalize_title_id(title_id)?;
        let path = self.profile_path(&tid)?;
        if path.exists() && !overwrite {
            return Err(ProfileError::Exists { title_id: tid, path });
        }

        let mut profile = GameProfile::new(tid, game_name);
        profile.description = description.to_string();
        profile.save(&path)?;
        log::debug!("Wrote profile {}", path.display());
        profile.source = Some(path);
        Ok(profile)
    }
}

#[cfg(test)]
#[path = "tests/profiles_tests.rs"]
mod tests;
