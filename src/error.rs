//! Error types
//!
//! Spawn, provider and configuration failures.

use thiserror::Error;

use crate::items::{Label, ResourceKey};

/// Why a label could not produce a resource key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// No catalog has finished loading yet
    CatalogNotLoaded,
    /// The label is not one of the tracked labels
    UnknownLabel,
    /// The label is tracked but has no keys
    NoKeys,
}

impl std::fmt::Display for Unavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unavailable::CatalogNotLoaded => write!(f, "catalog not loaded"),
            Unavailable::UnknownLabel => write!(f, "label not tracked"),
            Unavailable::NoKeys => write!(f, "no keys for label"),
        }
    }
}

/// Failures reported by a resource provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("failed to load locations for label {label}: {message}")]
    LabelLoad { label: Label, message: String },
    #[error("failed to instantiate {key}: {message}")]
    Instantiate { key: ResourceKey, message: String },
}

/// Failures of a single spawn request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// Nothing to spawn for this label. Recovered locally, never fatal.
    #[error("no item available for label {label}: {reason}")]
    NotAvailable { label: Label, reason: Unavailable },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl SpawnError {
    /// Check if this is the soft "nothing to spawn" case
    pub fn is_not_available(&self) -> bool {
        matches!(self, SpawnError::NotAvailable { .. })
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
