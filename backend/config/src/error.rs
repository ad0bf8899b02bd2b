use thiserror::Error;

use crate::spec::Version;

/// Which hook of a migration step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Pre,
    Post,
}

impl std::fmt::Display for HookStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookStage::Pre => f.write_str("pre"),
            HookStage::Post => f.write_str("post"),
        }
    }
}

/// Errors raised while migrating a settings tree.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("path does not resolve: {path}")]
    PathResolution { path: String },

    #[error("wildcard mismatch in path: {source_path:?} -> {destination_path:?}")]
    WildcardArity {
        source_path: String,
        destination_path: String,
    },

    #[error("unable to convert: config is at v{found}, spec expects v{expected}")]
    VersionMismatch { expected: Version, found: Version },

    #[error(
        "config conversion v{from} -> v{to} not supported (no spec for v{} -> v{})",
        .missing.0,
        .missing.1
    )]
    UnsupportedConversion {
        from: Version,
        to: Version,
        missing: (Version, Version),
    },

    #[error("{stage} hook failed for v{version_in} -> v{version_out}")]
    Hook {
        stage: HookStage,
        version_in: Version,
        version_out: Version,
        #[source]
        source: anyhow::Error,
    },
}

pub type MigrationResult<T> = Result<T, MigrationError>;
