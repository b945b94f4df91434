/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::Error;

use std::time::Duration;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// Fixation parameters for drift compensation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct FixationConfig {
    /// Angular dispersion tolerated within a fixation.
    pub dispersion_threshold_deg: f64,
    /// Samples a fixation must last. `None` uses the device's own count,
    /// which depends on its frame rate.
    pub sample_count: Option<usize>,
}

impl Default for FixationConfig {
    fn default() -> Self {
        FixationConfig {
            dispersion_threshold_deg: 1.0,
            sample_count: None,
        }
    }
}

/// Options for a new session.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct SessionInit {
    pub fixation: FixationConfig,
    /// How long a drift compensation may wait for a fixation, unless the
    /// request overrides it. `None` waits forever.
    pub drift_timeout: Option<Duration>,
    /// Fall back to the mouse when no eye tracker is available.
    pub allow_mouse_fallback: bool,
}

impl Default for SessionInit {
    fn default() -> Self {
        SessionInit {
            fixation: FixationConfig::default(),
            drift_timeout: Some(Duration::from_secs(10)),
            allow_mouse_fallback: true,
        }
    }
}

impl SessionInit {
    pub fn validate(&self) -> Result<(), Error> {
        let threshold = self.fixation.dispersion_threshold_deg;
        if !(threshold > 0.0 && threshold < 180.0) {
            return Err(Error::InvalidConfig(format!(
                "dispersion threshold must be within (0, 180) degrees, got {}",
                threshold
            )));
        }
        if self.fixation.sample_count == Some(0) {
            return Err(Error::InvalidConfig(
                "fixation sample count must be positive".into(),
            ));
        }
        if self.drift_timeout == Some(Duration::from_secs(0)) {
            return Err(Error::InvalidConfig("drift timeout must be positive".into()));
        }
        Ok(())
    }

    /// The fixation sample count, falling back to the device's.
    pub fn sample_count(&self, device_sample_count: usize) -> usize {
        self.fixation.sample_count.unwrap_or(device_sample_count).max(1)
    }
}
