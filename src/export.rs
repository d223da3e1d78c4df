//! `kpt export`: write a sample table as CSV.
//!
//! The whole table, or the rows matching a free-text term, in original
//! order. Output goes to `--output` (`-` for stdout) or to
//! `[export].output_dir` under the standard download name.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use kp_transit_core::export::{estimate_size, export_file_name, format_size, render_csv};
use kp_transit_core::query::filter_view;

use crate::config::Config;
use crate::load::{load_table, LoadedTable};

/// Where an export without `--output` lands.
pub fn default_output_path(config: &Config, input: &Path, table: &LoadedTable) -> PathBuf {
    let name = match table.origin() {
        Some((date, lat, lon)) => export_file_name(date, lat, lon),
        None => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "ascendant_changes".to_string());
            format!("{}.csv", stem)
        }
    };
    config.export.output_dir.join(name)
}

/// Resolve a path that may not exist yet through its parent directory.
fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(found) = std::fs::canonicalize(path) {
        return Some(found);
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path.file_name()?;
    std::fs::canonicalize(parent).ok().map(|dir| dir.join(name))
}

/// True when `output` names the same file as `input`, however spelled.
fn is_same_file(output: &Path, input: &Path) -> bool {
    if output == input {
        return true;
    }
    match (resolve(output), std::fs::canonicalize(input)) {
        (Some(out), Ok(inp)) => out == inp,
        _ => false,
    }
}

pub fn run_export(
    config: &Config,
    input: &Path,
    query: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let table = load_table(input)?;
    let term = query.unwrap_or("").trim();
    let rows = filter_view(&table.samples, term);

    let size = estimate_size(&rows);
    let csv = render_csv(&rows);

    match output {
        Some(path) if path == Path::new("-") => {
            print!("{}", csv);
        }
        _ => {
            let path = match output {
                Some(p) => p.to_path_buf(),
                None => default_output_path(config, input, &table),
            };
            if is_same_file(&path, input) {
                anyhow::bail!(
                    "Refusing to overwrite the input file {}; pass --output",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            std::fs::write(&path, &csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} of {} rows ({}) to {}",
                rows.len(),
                table.samples.len(),
                format_size(size),
                path.display()
            );
        }
    }

    Ok(())
}
