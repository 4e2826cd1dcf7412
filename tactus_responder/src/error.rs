// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Library errors.
//!
//! None of these cross the dispatcher: anomalies while routing are logged and show
//! up as [`Routed::Dropped`](crate::types::Routed::Dropped).

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or validate a [`DispatchConfig`](crate::config::DispatchConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The text is not valid TOML for the config schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field is out of range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Failure to hand an event to a [`DispatchPool`](crate::pool::DispatchPool).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was shut down, or its lane exited.
    #[error("dispatch lane {lane} is closed")]
    LaneClosed {
        /// Lane the event was partitioned to.
        lane: usize,
    },
}
