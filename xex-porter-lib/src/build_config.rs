//! Build configuration for the downstream recompiler.
//!
//! The document is written by hand rather than through a serializer: unknown
//! special addresses must appear as commented-out placeholders the user can
//! fill in later, and [`update_special_addresses`] later rewrites those lines
//! in place.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use xex_porter_core::util::to_forward_slashes;

/// File name of the generated configuration inside its directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Special routine addresses, in emission order.
pub const SPECIAL_ADDRESSES: &[&str] = &[
    "restgprlr_14",
    "savegprlr_14",
    "restfpr_14",
    "savefpr_14",
    "restvmx_14",
    "savevmx_14",
    "restvmx_64",
    "savevmx_64",
    "longjmp",
    "setjmp",
];

/// Code-generation toggles. All off until the basic port runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggles {
    pub skip_lr: bool,
    pub skip_msr: bool,
    pub ctr_as_local: bool,
    pub xer_as_local: bool,
    pub reserved_as_local: bool,
    pub cr_as_local: bool,
    pub non_argument_as_local: bool,
    pub non_volatile_as_local: bool,
}

impl Toggles {
    fn entries(&self) -> [(&'static str, bool); 8] {
        [
            ("skip_lr", self.skip_lr),
            ("skip_msr", self.skip_msr),
            ("ctr_as_local", self.ctr_as_local),
            ("xer_as_local", self.xer_as_local),
            ("reserved_as_local", self.reserved_as_local),
            ("cr_as_local", self.cr_as_local),
            ("non_argument_as_local", self.non_argument_as_local),
            ("non_volatile_as_local", self.non_volatile_as_local),
        ]
    }
}

/// A function boundary the analyser missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionHint {
    pub address: u32,
    pub size: u32,
}

/// An instruction word to skip during recompilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidInstruction {
    pub data: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidAsmHook {
    pub name: String,
    pub address: u32,
    #[serde(default)]
    pub registers: Vec<String>,
}

/// Everything written into a build configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub binary: PathBuf,
    pub out_directory: String,
    pub switch_table: Option<PathBuf>,
    pub patch_file: Option<PathBuf>,
    pub toggles: Toggles,
    /// Keyed by the names in [`SPECIAL_ADDRESSES`].
    pub addresses: BTreeMap<String, u32>,
    pub functions: Vec<FunctionHint>,
    pub invalid_instructions: Vec<InvalidInstruction>,
    pub midasm_hooks: Vec<MidAsmHook>,
    /// Extra `[main]` keys, written verbatim after the generated ones.
    pub custom: BTreeMap<String, toml::Value>,
    /// Label of the game profile applied, noted in the header.
    pub profile: Option<String>,
}

impl BuildConfig {
    /// Defaults for a fresh title: output into `ppc`, the analysis report as
    /// switch table, and zero padding words skipped.
    pub fn new(binary: impl Into<PathBuf>, switch_table: Option<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            out_directory: "ppc".to_string(),
            switch_table,
            patch_file: None,
            toggles: Toggles::default(),
            addresses: BTreeMap::new(),
            functions: Vec::new(),
            invalid_instructions: vec![InvalidInstruction { data: 0, size: 4 }],
            midasm_hooks: Vec::new(),
            custom: BTreeMap::new(),
            profile: None,
        }
    }

    /// Whether `key` is one the generated `[main]` section already writes.
    /// Such keys cannot be set through [`BuildConfig::custom`].
    pub fn is_generated_key(key: &str) -> bool {
        const FIXED: &[&str] = &[
            "file_path",
            "patch_file_path",
            "out_directory_path",
            "switch_table_file_path",
            "functions",
            "invalid_instructions",
            "midasm_hook",
        ];
        FIXED.contains(&key)
            || Toggles::default().entries().iter().any(|(name, _)| *name == key)
            || key
                .strip_suffix("_address")
                .is_some_and(|name| SPECIAL_ADDRESSES.contains(&name))
    }

    /// Render the document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "# Recompiler build configuration")?;
        if let Some(profile) = &self.profile {
            writeln!(out, "# Profile: {}", profile)?;
        }
        writeln!(out)?;
        writeln!(out, "[main]")?;
        writeln!(out, "file_path = {}", quoted_path(&self.binary))?;
        if let Some(patch) = &self.patch_file {
            writeln!(out, "patch_file_path = {}", quoted_path(patch))?;
        }
        writeln!(out, "out_directory_path = {}", quoted(&self.out_directory))?;
        if let Some(table) = &self.switch_table {
            writeln!(out, "switch_table_file_path = {}", quoted_path(table))?;
        }

        writeln!(out)?;
        writeln!(out, "# Optimizations: enable once the plain build runs")?;
        for (key, value) in self.toggles.entries() {
            writeln!(out, "{} = {}", key, value)?;
        }

        writeln!(out)?;
        writeln!(out, "# Register save/restore routines and setjmp/longjmp")?;
        for name in SPECIAL_ADDRESSES {
            match self.addresses.get(*name) {
                Some(addr) => writeln!(out, "{}_address = 0x{:08X}", name, addr)?,
                None => writeln!(out, "# {}_address = 0x00000000", name)?,
            }
        }

        writeln!(out)?;
        if self.functions.is_empty() {
            writeln!(out, "# functions = [")?;
            writeln!(out, "#     {{ address = 0x00000000, size = 0x00 }},")?;
            writeln!(out, "# ]")?;
        } else {
            writeln!(out, "functions = [")?;
            for f in &self.functions {
                writeln!(out, "    {{ address = 0x{:08X}, size = 0x{:X} }},", f.address, f.size)?;
            }
            writeln!(out, "]")?;
        }

        writeln!(out)?;
        if self.invalid_instructions.is_empty() {
            writeln!(out, "# invalid_instructions = [")?;
            writeln!(out, "#     {{ data = 0x00000000, size = 4 }},")?;
            writeln!(out, "# ]")?;
        } else {
            writeln!(out, "invalid_instructions = [")?;
            for i in &self.invalid_instructions {
                writeln!(out, "    {{ data = 0x{:08X}, size = {} }},", i.data, i.size)?;
            }
            writeln!(out, "]")?;
        }

        let custom: Vec<_> = self
            .custom
            .iter()
            .filter(|(key, _)| !Self::is_generated_key(key))
            .collect();
        if !custom.is_empty() {
            writeln!(out)?;
            writeln!(out, "# Profile values")?;
            for (key, value) in custom {
                writeln!(out, "{} = {}", toml_key(key), value)?;
            }
        }

        if self.midasm_hooks.is_empty() {
            writeln!(out)?;
            writeln!(out, "# [[midasm_hook]]")?;
            writeln!(out, "# name = \"MyHook\"")?;
            writeln!(out, "# address = 0x00000000")?;
            writeln!(out, "# registers = [\"r3\"]")?;
        }
        for hook in &self.midasm_hooks {
            writeln!(out)?;
            writeln!(out, "[[midasm_hook]]")?;
            writeln!(out, "name = {}", quoted(&hook.name))?;
            writeln!(out, "address = 0x{:08X}", hook.address)?;
            if !hook.registers.is_empty() {
                let regs: Vec<String> = hook.registers.iter().map(|r| quoted(r)).collect();
                writeln!(out, "registers = [{}]", regs.join(", "))?;
            }
        }
        Ok(())
    }

    /// Write the document to `dir/config.toml`, creating `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, self.render())?;
        log::debug!("Wrote build configuration {}", path.display());
        Ok(path)
    }
}

/// Activate or rewrite special-address lines in an existing configuration.
///
/// Keys are the bare names from [`SPECIAL_ADDRESSES`] (`restgprlr_14`); a
/// key already ending in `_address` is accepted as-is. Returns `true` if
/// at least one line changed. A missing file is reported as `Ok(false)`.
pub fn update_special_addresses(path: &Path, addresses: &BTreeMap<String, u32>) -> io::Result<bool> {
    if !path.is_file() {
        log::warn!("Build configuration not found: {}", path.display());
        return Ok(false);
    }
    let content = std::fs::read_to_string(path)?;

    let mut updated = false;
    let mut lines: Vec<String> = Vec::new();
    for line in content.lines() {
        match rewrite_address_line(line, addresses) {
            Some(replacement) => {
                if replacement != line {
                    updated = true;
                }
                lines.push(replacement);
            }
            None => lines.push(line.to_string()),
        }
    }

    if updated {
        let mut text = lines.join("\n");
        if content.ends_with('\n') {
            text.push('\n');
        }
        std::fs::write(path, text)?;
        log::info!("Updated special addresses in {}", path.display());
    }
    Ok(updated)
}

/// If `line` is an (optionally commented) `<key>_address = 0x...` line for a
/// key in `addresses`, return its active replacement.
fn rewrite_address_line(line: &str, addresses: &BTreeMap<String, u32>) -> Option<String> {
    let body = line.trim_start();
    let body = body.strip_prefix('#').map(str::trim_start).unwrap_or(body);
    let (key, value) = body.split_once('=')?;
    let key = key.trim();
    let value = value.trim();
    if !value.starts_with("0x") && !value.starts_with("0X") {
        return None;
    }

    let addr = addresses.iter().find_map(|(name, addr)| {
        let full = if name.ends_with("_address") {
            name.clone()
        } else {
            format!("{}_address", name)
        };
        (full == key).then_some(*addr)
    })?;
    Some(format!("{} = 0x{:08X}", key, addr))
}

fn toml_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare { key.to_string() } else { quoted(key) }
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quoted_path(path: &Path) -> String {
    quoted(&to_forward_slashes(path))
}

#[cfg(test)]
#[path = "tests/build_config_tests.rs"]
mod tests;
