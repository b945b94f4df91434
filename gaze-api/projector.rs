/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::Display;
use crate::GazeSample;
use crate::ScreenPlane;
use crate::Tracker;

use euclid::Point2D;
use euclid::Point3D;
use euclid::Rotation3D;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// Where a drift-compensated gaze ray meets the display.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct DriftCompensatedPoint {
    pub point_3d: Point3D<f64, Tracker>,
    pub point_2d: Point2D<f64, Display>,
}

/// Rotates the combined gaze direction of `sample` and re-projects it onto
/// the display. `None` when the sample has no usable 3D gaze ray, or the
/// corrected ray runs parallel to the display.
pub fn apply(
    sample: &GazeSample,
    rotation: &Rotation3D<f64, Tracker, Tracker>,
    screen: &ScreenPlane,
) -> Option<DriftCompensatedPoint> {
    let combined = &sample.combined;
    if !combined.has_valid_3d() {
        return None;
    }
    let origin = combined.valid_gaze_origin_3d()?;
    let direction = rotation.transform_vector3d(combined.gaze_direction()?);
    let point_3d = screen.intersect(origin, direction)?;
    Some(DriftCompensatedPoint {
        point_3d,
        point_2d: screen.project_normalized(point_3d),
    })
}
