// Copyright 2025 the Tactus Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch configuration.
//!
//! Every hand-tuned constant of the input core lives here so it can be adjusted per
//! installation. Missing fields take the defaults below; unknown fields are an error.
//!
//! ```toml
//! escalation_threshold = 30
//! min_zoom_distance = 150.0
//! surface_width = 3840.0
//! surface_height = 2160.0
//! lanes = 8
//! ```

use std::path::Path;
use std::time::Duration;

use kurbo::Size;
use serde::{Deserialize, Serialize};
use tactus_gesture::classify::Thresholds;
use tactus_gesture::escalate::EscalationConfig;

use crate::error::ConfigError;

/// Tunables of the dispatch core.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// Base sample threshold `T` of the escalator. Default 3.
    pub escalation_threshold: u32,
    /// Net travel a sustained gesture needs on both axes, in surface units. Default 0.
    pub min_travel: f64,
    /// Separation a pair must exceed to zoom, in surface units. Default 0.
    pub min_zoom_distance: f64,
    /// Twist a pair must reach to rotate, in radians. Default 0.
    pub min_rotation: f64,
    /// Physical surface width. Default 1920.
    pub surface_width: f64,
    /// Physical surface height. Default 1080.
    pub surface_height: f64,
    /// Touches are ignored for this long after pen activity; 0 disables. Default 250.
    pub pen_palm_rejection_ms: u64,
    /// Number of serial dispatch lanes. Default 4.
    pub lanes: usize,
    /// Delay before a closed component is detached. Default 500.
    pub detach_delay_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: 3,
            min_travel: 0.0,
            min_zoom_distance: 0.0,
            min_rotation: 0.0,
            surface_width: 1920.0,
            surface_height: 1080.0,
            pen_palm_rejection_ms: 250,
            lanes: 4,
            detach_delay_ms: 500,
        }
    }
}

impl DispatchConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.escalation_threshold == 0 {
            return Err(invalid("escalation_threshold", "must be at least 1"));
        }
        if self.lanes == 0 {
            return Err(invalid("lanes", "must be at least 1"));
        }
        for (field, value) in [
            ("min_travel", self.min_travel),
            ("min_zoom_distance", self.min_zoom_distance),
            ("min_rotation", self.min_rotation),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("{value} is not a finite, non-negative number")));
            }
        }
        for (field, value) in [
            ("surface_width", self.surface_width),
            ("surface_height", self.surface_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, format!("{value} is not a finite, positive number")));
            }
        }
        Ok(())
    }

    /// Physical surface size.
    pub fn surface(&self) -> Size {
        Size::new(self.surface_width, self.surface_height)
    }

    /// Classifier thresholds.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            surface: self.surface(),
            min_zoom_distance: self.min_zoom_distance,
            min_rotation: self.min_rotation,
        }
    }

    /// Escalator parameters.
    pub fn escalation(&self) -> EscalationConfig {
        EscalationConfig {
            threshold: self.escalation_threshold,
            min_travel: self.min_travel,
            surface: self.surface(),
        }
    }

    /// Palm rejection window, `None` when disabled.
    pub fn palm_rejection(&self) -> Option<Duration> {
        (self.pen_palm_rejection_ms > 0).then(|| Duration::from_millis(self.pen_palm_rejection_ms))
    }

    /// Delay before a closed component is detached.
    pub fn detach_delay(&self) -> Duration {
        Duration::from_millis(self.detach_delay_ms)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
