//! xex-porter CLI
//!
//! Command-line interface for dumping, analysing and cataloguing Xbox 360
//! titles ahead of static recompilation.

mod cli_types;
mod commands;
mod error;
mod spinner;

use std::io::Write;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cli_types::{CatalogAction, Cli, Commands, ConfigAction, ProfileAction, WorkspaceAction};
pub(crate) use error::CliError;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Pipeline {
            drive,
            iso,
            xex,
            output,
            no_catalog,
        } => commands::pipeline::run_pipeline(
            cli.config,
            cli.db,
            drive,
            iso,
            xex,
            output,
            no_catalog,
            cli.quiet,
        ),
        Commands::Analyse { xex } => commands::analyse::run_analyse(cli.config, &xex),
        Commands::Toml {
            xex,
            report,
            output,
            validate,
        } => commands::toml::run_toml(cli.config, &xex, report, output, validate),
        Commands::Catalog { action } => match action {
            CatalogAction::List { status, limit } => {
                commands::catalog::run_catalog_list(cli.config, cli.db, status, limit)
            }
            CatalogAction::Search { term } => {
                commands::catalog::run_catalog_search(cli.config, cli.db, &term)
            }
            CatalogAction::Show { id } => commands::catalog::run_catalog_show(cli.config, cli.db, id),
            CatalogAction::Status {
                id,
                status,
                notes,
                xex,
                iso,
            } => commands::catalog::run_catalog_status(
                cli.config, cli.db, id, &status, notes, xex, iso,
            ),
            CatalogAction::Delete { id, confirm } => {
                commands::catalog::run_catalog_delete(cli.config, cli.db, id, confirm)
            }
            CatalogAction::Stats => commands::catalog::run_catalog_stats(cli.config, cli.db),
        },
        Commands::Workspace { action } => match action {
            WorkspaceAction::Check { id } => {
                commands::workspace::run_workspace_check(cli.config, cli.db, id)
            }
            WorkspaceAction::Sync { id, verify } => {
                commands::workspace::run_workspace_sync(cli.config, cli.db, id, verify)
            }
            WorkspaceAction::List => commands::workspace::run_workspace_list(cli.config, cli.db),
        },
        Commands::Profiles { action } => match action {
            ProfileAction::List => commands::profiles::run_profiles_list(cli.config),
            ProfileAction::Show { title_id } => {
                commands::profiles::run_profiles_show(cli.config, &title_id)
            }
            ProfileAction::Create {
                title_id,
                name,
                description,
                force,
            } => commands::profiles::run_profiles_create(
                cli.config,
                &title_id,
                &name,
                description.as_deref().unwrap_or(""),
                force,
            ),
            ProfileAction::Default => commands::profiles::run_profiles_default(cli.config),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(cli.config),
            ConfigAction::Path => {
                commands::config::run_config_path(cli.config);
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// Install the logger. Info lines are printed bare so command output reads
/// as plain text; warnings and errors get a colored prefix. `--verbose`
/// adds timestamps, levels and debug output; `RUST_LOG` still overrides.
fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        log::LevelFilter::Warn
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stdout);

    builder.format(move |buf, record| {
        if verbose {
            return writeln!(
                buf,
                "{} {:<5} [{}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            );
        }
        match record.level() {
            log::Level::Error => writeln!(
                buf,
                "{} {}",
                "error:".if_supports_color(Stdout, |t| t.red()),
                record.args()
            ),
            log::Level::Warn => writeln!(
                buf,
                "{} {}",
                "warning:".if_supports_color(Stdout, |t| t.yellow()),
                record.args()
            ),
            _ => writeln!(buf, "{}", record.args()),
        }
    });
    builder.init();
}

/// Print an empty line through the logger, so `--quiet` hides it too.
pub(crate) fn log_blank() {
    log::info!("");
}
