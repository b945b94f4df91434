/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::Error;
use crate::ScreenPlane;
use crate::Tracker;

use euclid::Point3D;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// The display geometry as reported by the tracker, or restored from a
/// persisted configuration when the tracker can't report it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct DisplayArea {
    pub bottom_left: Point3D<f64, Tracker>,
    pub bottom_right: Point3D<f64, Tracker>,
    pub top_left: Point3D<f64, Tracker>,
    pub top_right: Point3D<f64, Tracker>,
    /// Physical width, in the unit of the corners.
    pub width: f64,
    /// Physical height, in the unit of the corners.
    pub height: f64,
}

impl DisplayArea {
    /// A display standing upright in the tracker's x/y plane, centered on
    /// the tracker horizontally, with its bottom edge at `y = 0`.
    pub fn upright(width: f64, height: f64) -> DisplayArea {
        let (half, top) = (width / 2.0, height);
        DisplayArea {
            bottom_left: Point3D::new(-half, 0.0, 0.0),
            bottom_right: Point3D::new(half, 0.0, 0.0),
            top_left: Point3D::new(-half, top, 0.0),
            top_right: Point3D::new(half, top, 0.0),
            width,
            height,
        }
    }

    pub fn screen_plane(&self) -> Result<ScreenPlane, Error> {
        ScreenPlane::new(
            self.bottom_left,
            self.bottom_right,
            self.top_left,
            self.top_right,
            self.width,
            self.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upright_display_centers_on_tracker() {
        let screen = DisplayArea::upright(520.0, 290.0).screen_plane().unwrap();
        assert_eq!(screen.center(), Point3D::new(0.0, 145.0, 0.0));
        let corner = screen.project_normalized(Point3D::new(-260.0, 0.0, 0.0));
        assert!((corner.x - 0.0).abs() < 1e-9);
        assert!((corner.y - 1.0).abs() < 1e-9);
    }
}
