//! Spec table validation: static checks with user-friendly messages.
//!
//! Catches authoring defects before a migration runs: malformed mappings,
//! steps that skip versions, and gaps in the version chain.

use std::collections::HashSet;

use thiserror::Error;

use crate::chain::next_step;
use crate::path::TreePath;
use crate::spec::{MigrationSpec, SpecTable, Version};

/// A spec validation issue with the step it was found in.
#[derive(Debug, Error)]
#[error("Spec v{}->v{}: {message}", .step.0, .step.1)]
pub struct SpecValidationError {
    pub step: (Version, Version),
    pub message: String,
}

/// All issues found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<SpecValidationError>,
    pub warnings: Vec<SpecValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, spec: &MigrationSpec, message: impl Into<String>) {
        self.errors.push(SpecValidationError {
            step: spec.step(),
            message: message.into(),
        });
    }

    fn warn(&mut self, spec: &MigrationSpec, message: impl Into<String>) {
        self.warnings.push(SpecValidationError {
            step: spec.step(),
            message: message.into(),
        });
    }
}

/// Validate every spec in the table.
pub fn validate(table: &SpecTable) -> ValidationReport {
    let mut report = ValidationReport::default();
    for spec in table.iter() {
        validate_step(spec, &mut report);
        validate_mapping(spec, &mut report);
        validate_defaults(spec, &mut report);
    }
    report
}

/// Steps must move exactly one version.
fn validate_step(spec: &MigrationSpec, report: &mut ValidationReport) {
    if spec.version_in.abs_diff(spec.version_out) != 1 {
        report.error(spec, "version_in and version_out must differ by exactly one");
    }
}

fn validate_mapping(spec: &MigrationSpec, report: &mut ValidationReport) {
    let mut destinations = HashSet::new();
    for (from, to) in &spec.mapping {
        let (source, destination) = (TreePath::parse(from), TreePath::parse(to));
        if source.wildcard_count() != destination.wildcard_count() {
            report.error(
                spec,
                format!("wildcard mismatch in mapping {from:?} -> {to:?}"),
            );
        }
        if source.segments().iter().any(|s| s.to_string().is_empty()) {
            report.warn(spec, format!("empty segment in source path {from:?}"));
        }
        if !destinations.insert(to.as_str()) {
            report.warn(spec, format!("destination {to:?} is mapped more than once"));
        }
    }

    if spec.copies_whole_tree() && spec.mapping.len() > 1 {
        report.warn(
            spec,
            "\"*\" -> \"*\" copies the whole tree; other mappings are ignored",
        );
    }
}

fn validate_defaults(spec: &MigrationSpec, report: &mut ValidationReport) {
    if spec.defaults.is_empty() {
        report.warn(spec, "no defaults declared; output keeps only mapped keys");
    }
}

/// Adjacent steps missing between `from` and `to`, in walk order.
pub fn missing_steps(table: &SpecTable, from: Version, to: Version) -> Vec<(Version, Version)> {
    let mut missing = Vec::new();
    let mut current = from;
    while current != to {
        let step = next_step(current, to);
        if table.get(step.0, step.1).is_none() {
            missing.push(step);
        }
        current = step.1;
    }
    missing
}
