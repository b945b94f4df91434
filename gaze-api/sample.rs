/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::Display;
use crate::HighResTimeStamp;
use crate::Tracker;

use euclid::Point2D;
use euclid::Point3D;
use euclid::Vector3D;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// A value reported by the tracker together with the tracker's own validity flag.
/// A value can be numerically present and still flagged invalid.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct Validated<T> {
    pub value: T,
    pub valid: bool,
}

impl<T> Validated<T> {
    pub fn new(value: T, valid: bool) -> Validated<T> {
        Validated { value, valid }
    }

    pub fn valid(value: T) -> Validated<T> {
        Validated::new(value, true)
    }

    pub fn invalid(value: T) -> Validated<T> {
        Validated::new(value, false)
    }

    /// The value, if the tracker vouched for it.
    pub fn get(&self) -> Option<&T> {
        if self.valid {
            Some(&self.value)
        } else {
            None
        }
    }
}

/// Combines one component of the left and right eye.
/// A NaN side is missing, so the other side is used verbatim.
pub fn combine(left: f64, right: f64) -> f64 {
    if left.is_nan() {
        right
    } else if right.is_nan() {
        left
    } else {
        (left + right) / 2.0
    }
}

fn combine_values<T: Copy>(
    left: Option<Validated<T>>,
    right: Option<Validated<T>>,
    missing: T,
    mean: impl Fn(T, T) -> T,
) -> Option<Validated<T>> {
    if left.is_none() && right.is_none() {
        return None;
    }
    let left = left.unwrap_or(Validated::invalid(missing));
    let right = right.unwrap_or(Validated::invalid(missing));
    Some(Validated::new(
        mean(left.value, right.value),
        left.valid && right.valid,
    ))
}

fn combine_point3d(left: Point3D<f64, Tracker>, right: Point3D<f64, Tracker>) -> Point3D<f64, Tracker> {
    Point3D::new(
        combine(left.x, right.x),
        combine(left.y, right.y),
        combine(left.z, right.z),
    )
}

fn missing_point3d() -> Point3D<f64, Tracker> {
    Point3D::new(f64::NAN, f64::NAN, f64::NAN)
}

/// Gaze data of one eye, or of both eyes combined.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct EyeData {
    pub gaze_point_2d: Validated<Point2D<f64, Display>>,
    pub gaze_point_3d: Option<Validated<Point3D<f64, Tracker>>>,
    pub gaze_origin_3d: Option<Validated<Point3D<f64, Tracker>>>,
    pub pupil_diameter: Option<Validated<f64>>,
    gaze_direction: Option<Vector3D<f64, Tracker>>,
    gaze_distance: Option<f64>,
}

impl EyeData {
    pub fn new(
        gaze_point_2d: Validated<Point2D<f64, Display>>,
        gaze_point_3d: Option<Validated<Point3D<f64, Tracker>>>,
        gaze_origin_3d: Option<Validated<Point3D<f64, Tracker>>>,
        pupil_diameter: Option<Validated<f64>>,
    ) -> EyeData {
        let gaze_direction = match (gaze_point_3d, gaze_origin_3d) {
            (Some(point), Some(origin)) => Some(point.value - origin.value),
            _ => None,
        };
        let gaze_distance = gaze_direction.map(|direction| direction.length());
        EyeData {
            gaze_point_2d,
            gaze_point_3d,
            gaze_origin_3d,
            pupil_diameter,
            gaze_direction,
            gaze_distance,
        }
    }

    /// Eye data that only carries a 2D gaze point, as produced by the mouse.
    pub fn from_point_2d(point: Point2D<f64, Display>, valid: bool) -> EyeData {
        EyeData::new(Validated::new(point, valid), None, None, None)
    }

    /// The NaN-aware average of both eyes. Every combined flag is valid
    /// only if it is valid for both eyes.
    pub fn combine(left: &EyeData, right: &EyeData) -> EyeData {
        let gaze_point_2d = Validated::new(
            Point2D::new(
                combine(left.gaze_point_2d.value.x, right.gaze_point_2d.value.x),
                combine(left.gaze_point_2d.value.y, right.gaze_point_2d.value.y),
            ),
            left.gaze_point_2d.valid && right.gaze_point_2d.valid,
        );
        let gaze_point_3d = combine_values(
            left.gaze_point_3d,
            right.gaze_point_3d,
            missing_point3d(),
            combine_point3d,
        );
        let gaze_origin_3d = combine_values(
            left.gaze_origin_3d,
            right.gaze_origin_3d,
            missing_point3d(),
            combine_point3d,
        );
        let pupil_diameter =
            combine_values(left.pupil_diameter, right.pupil_diameter, f64::NAN, combine);
        EyeData::new(gaze_point_2d, gaze_point_3d, gaze_origin_3d, pupil_diameter)
    }

    /// Gaze point minus gaze origin, when both are present.
    pub fn gaze_direction(&self) -> Option<Vector3D<f64, Tracker>> {
        self.gaze_direction
    }

    /// Length of `gaze_direction`.
    pub fn gaze_distance(&self) -> Option<f64> {
        self.gaze_distance
    }

    pub fn valid_gaze_point_3d(&self) -> Option<Point3D<f64, Tracker>> {
        self.gaze_point_3d.and_then(|p| p.get().copied())
    }

    pub fn valid_gaze_origin_3d(&self) -> Option<Point3D<f64, Tracker>> {
        self.gaze_origin_3d.and_then(|p| p.get().copied())
    }

    /// Whether both the 3D gaze point and the 3D gaze origin are present and valid.
    pub fn has_valid_3d(&self) -> bool {
        self.valid_gaze_point_3d().is_some() && self.valid_gaze_origin_3d().is_some()
    }
}

/// One tracker frame.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct GazeSample {
    /// Device-relative, monotonic.
    pub timestamp: HighResTimeStamp,
    pub left: EyeData,
    pub right: EyeData,
    pub combined: EyeData,
}

impl GazeSample {
    pub fn new(timestamp: HighResTimeStamp, left: EyeData, right: EyeData) -> GazeSample {
        let combined = EyeData::combine(&left, &right);
        GazeSample {
            timestamp,
            left,
            right,
            combined,
        }
    }
}
