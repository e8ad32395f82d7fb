//! Error types
//!
//! The allocation core and the ingestion layer fail in different ways and callers
//! treat them differently, so they get separate enums:
//!
//! - [`LicenseError`] - the rule is unusable or some demand cannot be covered
//! - [`SourceError`] - the install log could not be read or parsed
//!
//! Orchestration code (config, analyzer, CLI) wraps both in `anyhow::Error`; the
//! typed values remain available through `downcast_ref`.

use crate::models::Category;
use std::path::PathBuf;
use thiserror::Error;

/// Why a [`crate::models::LicenseRule`] is not usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("rule allows no installation (total cap is 0 or every category cap is 0)")]
    NoInstallAllowed,

    #[error("{category} cap {cap} exceeds total cap {total}")]
    CategoryCapExceedsTotal {
        category: Category,
        cap: u32,
        total: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseError {
    #[error("invalid license rule: {0}")]
    RuleValidation(#[from] RuleViolation),

    #[error("rule cannot cover {category} installs of user {user_id}")]
    InfeasibleDemand { user_id: u64, category: Category },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("install log {path} is unavailable")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record in {path} at line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("invalid input pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("no install log matches {pattern}")]
    NoMatches { pattern: String },
}
