use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xex_porter_core::{IdentityField, ParsedIdentity, parse_identity_report};
use xex_porter_lib::{ExternalToolchain, SystemToolRunner, Toolchain};

use crate::CliError;

use super::load_settings;

/// Entry point for `analyse`: run the inspection tool and print what it found.
pub(crate) fn run_analyse(config: Option<PathBuf>, xex: &Path) -> Result<(), CliError> {
    if !xex.is_file() {
        return Err(CliError::not_found(format!("binary {}", xex.display())));
    }
    let settings = load_settings(config)?;
    let runner = SystemToolRunner;
    let toolchain = ExternalToolchain::new(&settings, &runner);

    let text = toolchain
        .identity_text(xex)
        .map_err(|e| CliError::tool(e.to_string()))?;
    let parsed = parse_identity_report(&text);
    print_identity(xex, &parsed);
    Ok(())
}

fn print_identity(xex: &Path, parsed: &ParsedIdentity) {
    let id = &parsed.identity;
    log::info!(
        "{}",
        xex.display().if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    let field = |label: &str, value: &str, resolved: bool| {
        let shown = if resolved && !value.is_empty() {
            value.to_string()
        } else {
            "-".to_string()
        };
        log::info!(
            "  {} {}",
            format!("{:<18}", format!("{}:", label)).if_supports_color(Stdout, |t| t.cyan()),
            shown
        );
    };

    field("Name", &id.display_name(), parsed.is_resolved(IdentityField::OriginalPeName));
    field("Original PE name", &id.original_pe_name, parsed.is_resolved(IdentityField::OriginalPeName));
    field("Title id", &id.title_id, parsed.is_resolved(IdentityField::TitleId));
    field("Media id", &id.media_id, parsed.is_resolved(IdentityField::MediaId));
    field("Version", &id.version, parsed.is_resolved(IdentityField::Version));
    field("Base version", &id.base_version, parsed.is_resolved(IdentityField::BaseVersion));
    field(
        "Disc",
        &format!("{} of {}", id.disc_number, id.total_discs),
        true,
    );
    field("Regions", &id.regions, parsed.is_resolved(IdentityField::Regions));
    field("ESRB", &id.esrb_rating, parsed.is_resolved(IdentityField::EsrbRating));
    field("PEGI", &id.pegi_rating, parsed.is_resolved(IdentityField::PegiRating));
    field("Load address", &id.load_address, parsed.is_resolved(IdentityField::LoadAddress));
    field("Entry point", &id.entry_point, parsed.is_resolved(IdentityField::EntryPoint));
    field("Image size", &id.image_size, parsed.is_resolved(IdentityField::ImageSize));
    field(
        "Flags",
        &format!(
            "{}, {}, {}",
            if id.is_retail { "retail" } else { "devkit" },
            if id.is_encrypted { "encrypted" } else { "unencrypted" },
            if id.is_compressed { "compressed" } else { "uncompressed" },
        ),
        true,
    );

    if !id.static_libraries.is_empty() {
        crate::log_blank();
        log::info!("  Static libraries:");
        for lib in &id.static_libraries {
            log::info!("    {}", lib);
        }
    }

    if !parsed.has_title_id() {
        crate::log_blank();
        log::warn!("No title id found; this binary cannot be catalogued.");
    }
}
