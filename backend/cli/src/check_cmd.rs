//! CLI Check Command
//!
//! Validates a spec document and reports gaps in the version chain.

use std::path::Path;

use anyhow::{bail, Result};
use ltconfig_config::{load_spec_file, missing_steps, validate, HookRegistry, Version};

use crate::terminal_output::{note_error, note_success, note_warn, render_table};

pub async fn run(specs_path: &Path, range: Option<(Version, Version)>) -> Result<()> {
    let table = load_spec_file(specs_path, &HookRegistry::with_builtins()).await?;
    let report = validate(&table);

    let rows: Vec<Vec<String>> = report
        .errors
        .iter()
        .map(|issue| ("error", issue))
        .chain(report.warnings.iter().map(|issue| ("warning", issue)))
        .map(|(level, issue)| {
            vec![
                format!("v{}->v{}", issue.step.0, issue.step.1),
                level.to_string(),
                issue.message.clone(),
            ]
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", render_table(&["Step", "Level", "Message"], &rows));
    }

    let gaps = match range {
        Some((from, to)) => missing_steps(&table, from, to),
        None => Vec::new(),
    };
    for (from, to) in &gaps {
        note_error(&format!("No spec for step v{from} -> v{to}"));
    }

    if !report.is_valid() || !gaps.is_empty() {
        bail!(
            "{} error(s), {} missing step(s) in {}",
            report.errors.len(),
            gaps.len(),
            specs_path.display()
        );
    }
    if !report.warnings.is_empty() {
        note_warn(&format!("{} warning(s)", report.warnings.len()));
    }
    note_success(&format!("{} spec(s) valid", table.len()));
    Ok(())
}
