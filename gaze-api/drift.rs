/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Fixation-triggered drift compensation.
//!
//! While armed, the compensator keeps a sliding window of the last N samples
//! with valid 3D data. As soon as that window is a fixation, it computes the
//! rotation that takes the observed gaze direction onto the direction of the
//! fixation target, and disarms itself.

use crate::fixation;
use crate::GazeSample;
use crate::HighResTimeStamp;
use crate::ScreenPlane;
use crate::Tracker;

use euclid::Point3D;
use euclid::Rotation3D;
use euclid::Vector3D;

use log::debug;
use log::info;

use std::collections::VecDeque;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// Directions with a dot product beyond this are treated as (anti)parallel.
const ALIGNED_DOT: f64 = 0.999999;

/// The compensation currently in effect.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct DriftState {
    pub rotation: Rotation3D<f64, Tracker, Tracker>,
    /// Timestamp of the sample that completed the fixation.
    pub timestamp: HighResTimeStamp,
}

impl Default for DriftState {
    fn default() -> Self {
        DriftState {
            rotation: Rotation3D::identity(),
            timestamp: 0.0,
        }
    }
}

impl DriftState {
    /// Size of the correction, in degrees.
    pub fn correction_degrees(&self) -> f64 {
        2.0 * self.rotation.r.abs().min(1.0).acos().to_degrees()
    }
}

/// The shortest-arc rotation taking `from` onto `to`.
pub fn rotation_between(
    from: Vector3D<f64, Tracker>,
    to: Vector3D<f64, Tracker>,
) -> Rotation3D<f64, Tracker, Tracker> {
    let (from, to) = (from.normalize(), to.normalize());
    let dot = from.dot(to);
    if !dot.is_finite() {
        return Rotation3D::identity();
    }
    if dot > ALIGNED_DOT {
        return Rotation3D::identity();
    }
    if dot < -ALIGNED_DOT {
        // The cross product vanishes; any axis perpendicular to `from` works.
        let helper = if from.x.abs() < 0.9 {
            Vector3D::new(1.0, 0.0, 0.0)
        } else {
            Vector3D::new(0.0, 1.0, 0.0)
        };
        let axis = from.cross(helper).normalize();
        return Rotation3D::quaternion(axis.x, axis.y, axis.z, 0.0);
    }
    let axis = from.cross(to);
    Rotation3D::unit_quaternion(axis.x, axis.y, axis.z, 1.0 + dot)
}

fn has_direction(vector: Vector3D<f64, Tracker>) -> bool {
    let length = vector.length();
    length.is_finite() && length > f64::EPSILON
}

/// The drift compensation state machine.
///
/// Every mutation takes `&mut self`; the owner (normally the session thread)
/// is the only writer, and hands out `DriftState` copies to readers.
#[derive(Debug)]
pub struct DriftCompensator {
    state: DriftState,
    window: VecDeque<GazeSample>,
    collecting: bool,
    fixation_point: Point3D<f64, Tracker>,
    sample_count: usize,
    normalized_threshold: f64,
}

impl DriftCompensator {
    /// # Panics
    ///
    /// If `sample_count` is zero.
    pub fn new(
        fixation_point: Point3D<f64, Tracker>,
        sample_count: usize,
        threshold_degrees: f64,
    ) -> DriftCompensator {
        assert!(sample_count > 0, "fixation needs at least one sample");
        DriftCompensator {
            state: DriftState::default(),
            window: VecDeque::with_capacity(sample_count),
            collecting: false,
            fixation_point,
            sample_count,
            normalized_threshold: fixation::normalized_threshold(threshold_degrees),
        }
    }

    /// A compensator targeting the center of the display.
    pub fn for_screen(
        screen: &ScreenPlane,
        sample_count: usize,
        threshold_degrees: f64,
    ) -> DriftCompensator {
        DriftCompensator::new(screen.center(), sample_count, threshold_degrees)
    }

    /// Arms collection. Returns `false` if it was already armed.
    /// The compensation currently in effect stays in effect.
    pub fn start(&mut self) -> bool {
        if self.collecting {
            return false;
        }
        debug!("Drift compensation armed ({} samples)", self.sample_count);
        self.collecting = true;
        true
    }

    /// Drops the window and any compensation.
    pub fn reset(&mut self) {
        self.window.clear();
        self.state = DriftState::default();
        self.collecting = false;
    }

    /// Abandons the current attempt, keeping the compensation in effect.
    pub fn cancel(&mut self) {
        if self.collecting {
            debug!("Drift compensation abandoned with {} samples", self.window.len());
        }
        self.window.clear();
        self.collecting = false;
    }

    /// Offers a sample. Returns the new state iff this sample completed a
    /// fixation and a new rotation was computed.
    pub fn update(&mut self, sample: &GazeSample) -> Option<DriftState> {
        if !self.collecting || !sample.combined.has_valid_3d() {
            return None;
        }

        self.window.push_back(*sample);
        if self.window.len() < self.sample_count {
            return None;
        }

        if !fixation::is_fixation(&self.window, self.normalized_threshold) {
            self.window.pop_front();
            return None;
        }

        let mut origin_sum: Vector3D<f64, Tracker> = Vector3D::zero();
        let mut point_sum: Vector3D<f64, Tracker> = Vector3D::zero();
        for collected in &self.window {
            if let (Some(origin), Some(point)) = (
                collected.combined.valid_gaze_origin_3d(),
                collected.combined.valid_gaze_point_3d(),
            ) {
                origin_sum += origin.to_vector();
                point_sum += point.to_vector();
            }
        }
        let count = self.sample_count as f64;
        let origin: Point3D<f64, Tracker> = (origin_sum / count).to_point();
        let point: Point3D<f64, Tracker> = (point_sum / count).to_point();

        let gaze = point - origin;
        let target = self.fixation_point - origin;
        if !has_direction(gaze) || !has_direction(target) {
            debug!("Fixation without a usable gaze direction, sliding on");
            self.window.pop_front();
            return None;
        }
        let gaze_direction = gaze.normalize();
        let target_direction = target.normalize();

        self.state = DriftState {
            rotation: rotation_between(gaze_direction, target_direction),
            timestamp: sample.timestamp,
        };
        self.window.clear();
        self.collecting = false;

        info!(
            "Drift compensation computed at {}: {:.3} degrees",
            sample.timestamp,
            self.state.correction_degrees()
        );
        Some(self.state)
    }

    /// Retargets the compensator, e.g. after the display moved.
    /// Samples collected against the old target are dropped.
    pub fn set_fixation_point(&mut self, fixation_point: Point3D<f64, Tracker>) {
        self.fixation_point = fixation_point;
        self.window.clear();
    }

    pub fn fixation_point(&self) -> Point3D<f64, Tracker> {
        self.fixation_point
    }

    pub fn state(&self) -> DriftState {
        self.state
    }

    pub fn rotation(&self) -> Rotation3D<f64, Tracker, Tracker> {
        self.state.rotation
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// The collected samples, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &GazeSample> {
        self.window.iter()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn normalized_threshold(&self) -> f64 {
        self.normalized_threshold
    }
}
