/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The mouse standing in for an eye tracker.
//!
//! Cursor positions are fed in by whatever watches the system pointer, as
//! display fractions. The device samples the latest position at a fixed
//! rate. Mouse samples never carry 3D data, so they are never drift
//! compensated.

use crossbeam_channel::Receiver;
use crossbeam_channel::RecvTimeoutError;
use crossbeam_channel::Sender;

use euclid::Point2D;

use gaze_api::Device;
use gaze_api::Discovery;
use gaze_api::Display;
use gaze_api::DisplayArea;
use gaze_api::Error;
use gaze_api::EyeData;
use gaze_api::Frame;
use gaze_api::GazeSample;
use gaze_api::Quitter;
use gaze_api::Session;
use gaze_api::SessionBuilder;
use gaze_api::SessionMode;

use log::debug;
use log::info;

use std::time::Duration;
use std::time::Instant;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct MouseConfig {
    pub sample_rate_hz: f64,
    /// How long the pointer must rest to count as a fixation.
    pub fixation_duration: Duration,
}

impl Default for MouseConfig {
    fn default() -> Self {
        MouseConfig {
            sample_rate_hz: 60.0,
            fixation_duration: Duration::from_secs(1),
        }
    }
}

impl MouseConfig {
    fn sample_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.sample_rate_hz)
    }

    fn fixation_sample_count(&self) -> usize {
        ((self.fixation_duration.as_secs_f64() * self.sample_rate_hz).round() as usize).max(1)
    }
}

pub struct MouseDiscovery {
    display_area: DisplayArea,
    config: MouseConfig,
    cursor: Receiver<Point2D<f64, Display>>,
}

impl MouseDiscovery {
    /// Returns the discovery, and the sender the pointer watcher feeds.
    pub fn new(
        display_area: DisplayArea,
        config: MouseConfig,
    ) -> Result<(MouseDiscovery, Sender<Point2D<f64, Display>>), Error> {
        if !(config.sample_rate_hz > 0.0 && config.sample_rate_hz.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "mouse sample rate must be positive, got {}",
                config.sample_rate_hz
            )));
        }
        let (sender, cursor) = crossbeam_channel::unbounded();
        let discovery = MouseDiscovery {
            display_area,
            config,
            cursor,
        };
        Ok((discovery, sender))
    }
}

impl Discovery for MouseDiscovery {
    fn request_session(
        &mut self,
        mode: SessionMode,
        builder: SessionBuilder,
    ) -> Result<Session, Error> {
        if !self.supports_session(mode) {
            return Err(Error::NoMatchingDevice);
        }
        let display_area = self.display_area;
        let config = self.config;
        let cursor = self.cursor.clone();
        builder.spawn(move || Ok(MouseDevice::new(display_area, config, cursor)))
    }

    fn supports_session(&self, mode: SessionMode) -> bool {
        mode == SessionMode::Mouse
    }
}

// After a stall the schedule restarts from `now` instead of bursting to catch up.
fn next_sample_due(previous: Instant, interval: Duration, now: Instant) -> Instant {
    (previous + interval).max(now)
}

struct MouseDevice {
    display_area: DisplayArea,
    config: MouseConfig,
    cursor: Receiver<Point2D<f64, Display>>,
    position: Option<Point2D<f64, Display>>,
    next_sample: Instant,
    start_ns: u64,
}

impl MouseDevice {
    fn new(
        display_area: DisplayArea,
        config: MouseConfig,
        cursor: Receiver<Point2D<f64, Display>>,
    ) -> MouseDevice {
        info!("Using the mouse at {} Hz", config.sample_rate_hz);
        MouseDevice {
            display_area,
            config,
            cursor,
            position: None,
            next_sample: Instant::now(),
            start_ns: time::precise_time_ns(),
        }
    }

    fn timestamp(&self) -> f64 {
        (time::precise_time_ns() - self.start_ns) as f64 / 1_000_000.0
    }
}

impl Device for MouseDevice {
    fn display_area(&self) -> DisplayArea {
        self.display_area
    }

    fn fixation_sample_count(&self) -> usize {
        self.config.fixation_sample_count()
    }

    fn wait_for_frame(&mut self) -> Option<Frame> {
        // Track the pointer until the next sample is due.
        loop {
            let now = Instant::now();
            if now >= self.next_sample {
                break;
            }
            match self.cursor.recv_timeout(self.next_sample - now) {
                Ok(position) => self.position = Some(position),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Pointer watcher went away");
                    return None;
                }
            }
        }
        while let Ok(position) = self.cursor.try_recv() {
            self.position = Some(position);
        }
        let interval = self.config.sample_interval();
        self.next_sample = next_sample_due(self.next_sample, interval, Instant::now());

        let sample = self.position.map(|position| {
            let eye = EyeData::from_point_2d(position, true);
            GazeSample::new(self.timestamp(), eye, eye)
        });
        Some(Frame {
            sample,
            events: vec![],
        })
    }

    fn quit(&mut self) {
        debug!("Mouse device released");
    }

    // The session ends when the pointer watcher goes away, see `wait_for_frame`.
    fn set_quitter(&mut self, _quitter: Quitter) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixation_count_follows_sample_rate() {
        let config = MouseConfig {
            sample_rate_hz: 120.0,
            fixation_duration: Duration::from_millis(500),
        };
        assert_eq!(config.fixation_sample_count(), 60);
        assert_eq!(MouseConfig::default().fixation_sample_count(), 60);
    }

    #[test]
    fn schedule_does_not_burst_after_a_stall() {
        let interval = Duration::from_millis(16);
        let start = Instant::now();
        assert_eq!(next_sample_due(start, interval, start), start + interval);

        let late = start + Duration::from_millis(500);
        assert_eq!(next_sample_due(start, interval, late), late);
    }

    #[test]
    fn rejects_non_positive_rate() {
        let config = MouseConfig {
            sample_rate_hz: 0.0,
            ..MouseConfig::default()
        };
        assert!(MouseDiscovery::new(DisplayArea::upright(520.0, 290.0), config).is_err());
    }
}
