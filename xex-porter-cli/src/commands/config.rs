use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xex_porter_lib::settings::settings_path;
use xex_porter_lib::{SettingSource, Tool};

use crate::CliError;

use super::load_settings;

/// Show resolved settings and their sources.
pub(crate) fn run_config_show(config: Option<PathBuf>) -> Result<(), CliError> {
    let settings = load_settings(config)?;

    log::info!(
        "{}",
        "xex-porter Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    match &settings.file {
        Some(p) if p.exists() => {
            log::info!(
                "  Settings file: {} {}",
                p.display().if_supports_color(Stdout, |t| t.cyan()),
                "(exists)".if_supports_color(Stdout, |t| t.green()),
            );
        }
        Some(p) => {
            log::info!(
                "  Settings file: {} {}",
                p.display().if_supports_color(Stdout, |t| t.cyan()),
                "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
        None => {
            log::info!(
                "  Settings file: {}",
                "none".if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
    }
    crate::log_blank();

    log::info!("  {}", "Tools".if_supports_color(Stdout, |t| t.bold()));
    for tool in Tool::ALL {
        let source = settings.tool_source(tool);
        let source_str = format!("({})", source);
        let path = settings.tool(tool);
        let shown = path.display().to_string();
        match source {
            SettingSource::Default => log::info!(
                "    {} {} {}",
                format!("{:<20}", format!("{}:", tool.key())).if_supports_color(Stdout, |t| t.cyan()),
                shown.if_supports_color(Stdout, |t| t.yellow()),
                source_str.if_supports_color(Stdout, |t| t.dimmed()),
            ),
            _ => log::info!(
                "    {} {} {}",
                format!("{:<20}", format!("{}:", tool.key())).if_supports_color(Stdout, |t| t.cyan()),
                shown,
                source_str.if_supports_color(Stdout, |t| t.dimmed()),
            ),
        }
    }
    crate::log_blank();

    log::info!("  {}", "Paths".if_supports_color(Stdout, |t| t.bold()));
    let paths = [
        ("temp_dir", &settings.temp_dir),
        ("ports_root", &settings.ports_root),
        ("database", &settings.database),
        ("profiles_dir", &settings.profiles_dir),
    ];
    for (key, path) in paths {
        log::info!(
            "    {} {}",
            format!("{:<20}", format!("{}:", key)).if_supports_color(Stdout, |t| t.cyan()),
            path.display()
        );
    }
    crate::log_blank();

    log::info!("  {}", "Timeouts".if_supports_color(Stdout, |t| t.bold()));
    let timeouts = [
        ("dump", settings.timeouts.dump()),
        ("extract", settings.timeouts.extract()),
        ("analyse", settings.timeouts.analyse()),
        ("clean", settings.timeouts.clean()),
    ];
    for (key, duration) in timeouts {
        log::info!(
            "    {} {}s",
            format!("{:<20}", format!("{}:", key)).if_supports_color(Stdout, |t| t.cyan()),
            duration.as_secs()
        );
    }
    crate::log_blank();

    log::info!(
        "  {} {}",
        format!("{:<22}", "verify_content:").if_supports_color(Stdout, |t| t.cyan()),
        settings.verify_content
    );
    Ok(())
}

/// Print the settings file path.
pub(crate) fn run_config_path(config: Option<PathBuf>) {
    let path = config.unwrap_or_else(settings_path);
    log::info!("{}", path.display());
}
