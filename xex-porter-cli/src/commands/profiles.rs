use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xex_porter_lib::{GameProfile, ProfileError, ProfileManager};

use crate::CliError;

use super::{load_settings, truncate_str};

fn profile_error(e: ProfileError) -> CliError {
    match e {
        ProfileError::InvalidTitleId(_) | ProfileError::Exists { .. } => {
            CliError::invalid_argument(e.to_string())
        }
        _ => CliError::config(e.to_string()),
    }
}

fn manager(config: Option<PathBuf>) -> Result<ProfileManager, CliError> {
    let settings = load_settings(config)?;
    Ok(ProfileManager::new(settings.profiles_dir))
}

fn print_profile(profile: &GameProfile) {
    log::info!(
        "{} {}",
        profile.game_name.if_supports_color(Stdout, |t| t.bold()),
        format!("[{}]", profile.title_id).if_supports_color(Stdout, |t| t.dimmed()),
    );
    if !profile.description.is_empty() {
        log::info!("  {}", profile.description);
    }
    if let Some(source) = &profile.source {
        log::info!(
            "  {}",
            source.display().if_supports_color(Stdout, |t| t.dimmed())
        );
    }

    let row = |label: &str, value: String| {
        log::info!(
            "    {} {}",
            format!("{:<24}", format!("{}:", label)).if_supports_color(Stdout, |t| t.cyan()),
            value
        );
    };

    let recomp = &profile.recomp;
    if !recomp.is_empty() {
        crate::log_blank();
        log::info!("  {}", "Recompiler".if_supports_color(Stdout, |t| t.bold()));
        for (key, value) in recomp.toggle_overrides() {
            row(key, value.to_string());
        }
        if let Some(dir) = &recomp.out_directory {
            row("out_directory", dir.clone());
        }
        if let Some(patch) = &recomp.patch_file {
            row("patch_file", patch.display().to_string());
        }
        for (name, addr) in &recomp.addresses {
            row(name.as_str(), format!("0x{:08X}", addr));
        }
        if !recomp.functions.is_empty() {
            row("functions", recomp.functions.len().to_string());
        }
        if !recomp.invalid_instructions.is_empty() {
            row("invalid_instructions", recomp.invalid_instructions.len().to_string());
        }
        for hook in &recomp.midasm_hooks {
            row("midasm_hook", format!("{} @ 0x{:08X}", hook.name, hook.address));
        }
    }

    if !profile.patches.is_empty() {
        crate::log_blank();
        log::info!("  {}", "Patches".if_supports_color(Stdout, |t| t.bold()));
        for (name, on) in &profile.patches {
            if *on {
                log::info!(
                    "    {} {}",
                    "\u{2713}".if_supports_color(Stdout, |t| t.green()),
                    name
                );
            } else {
                log::info!(
                    "    {} {}",
                    "-".if_supports_color(Stdout, |t| t.dimmed()),
                    name.if_supports_color(Stdout, |t| t.dimmed())
                );
            }
        }
    }

    if !profile.custom.is_empty() {
        crate::log_blank();
        log::info!("  {}", "Custom values".if_supports_color(Stdout, |t| t.bold()));
        for (key, value) in &profile.custom {
            row(key.as_str(), value.to_string());
        }
    }
}

/// Entry point for `profiles list`.
pub(crate) fn run_profiles_list(config: Option<PathBuf>) -> Result<(), CliError> {
    let manager = manager(config)?;
    let profiles = manager.list_profiles().map_err(profile_error)?;

    log::info!(
        "{} {}",
        "Profiles:".if_supports_color(Stdout, |t| t.bold()),
        manager.dir().display()
    );
    if profiles.is_empty() {
        log::info!("  No profiles yet. Create one with 'xex-porter profiles create'.");
        return Ok(());
    }

    crate::log_blank();
    for profile in &profiles {
        let patches = profile.enabled_patches().count();
        let patch_note = if patches > 0 {
            format!("{} patch(es)", patches)
        } else {
            String::new()
        };
        log::info!(
            "  {:<8}  {:<40}  {}",
            profile.title_id,
            truncate_str(&profile.game_name, 40),
            patch_note.if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    Ok(())
}

/// Entry point for `profiles show`.
pub(crate) fn run_profiles_show(config: Option<PathBuf>, title_id: &str) -> Result<(), CliError> {
    let manager = manager(config)?;
    let profile = manager
        .load_profile(title_id)
        .map_err(profile_error)?
        .ok_or_else(|| CliError::not_found(format!("no profile for {}", title_id)))?;
    print_profile(&profile);
    Ok(())
}

/// Entry point for `profiles create`.
pub(crate) fn run_profiles_create(
    config: Option<PathBuf>,
    title_id: &str,
    name: &str,
    description: &str,
    force: bool,
) -> Result<(), CliError> {
    let manager = manager(config)?;
    let profile = manager
        .create_profile(title_id, name, description, force)
        .map_err(profile_error)?;
    log::info!(
        "{} {}",
        "Created profile".if_supports_color(Stdout, |t| t.green()),
        profile.label()
    );
    if let Some(path) = &profile.source {
        log::info!("  {}", path.display());
    }
    Ok(())
}

/// Entry point for `profiles default`.
pub(crate) fn run_profiles_default(config: Option<PathBuf>) -> Result<(), CliError> {
    let manager = manager(config)?;
    print_profile(&manager.default_profile());
    Ok(())
}
