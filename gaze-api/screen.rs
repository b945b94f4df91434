/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::Display;
use crate::Error;
use crate::Plane;
use crate::Tracker;

use euclid::Point2D;
use euclid::Point3D;
use euclid::Transform3D;
use euclid::Vector3D;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// Rays whose direction is closer than this to the plane are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-9;

/// The physical display, modelled as a quadrilateral in tracker space.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct ScreenPlane {
    pub top_left: Point3D<f64, Tracker>,
    pub top_right: Point3D<f64, Tracker>,
    pub bottom_left: Point3D<f64, Tracker>,
    pub bottom_right: Point3D<f64, Tracker>,
    width: f64,
    height: f64,
    center: Point3D<f64, Tracker>,
    normal: Vector3D<f64, Tracker>,
    /// Maps tracker points to (u, v, distance along the normal).
    to_plane: Transform3D<f64, Tracker, Plane>,
    /// Projection of `top_left`, subtracted before normalizing.
    origin: Point2D<f64, Plane>,
}

impl ScreenPlane {
    pub fn new(
        bottom_left: Point3D<f64, Tracker>,
        bottom_right: Point3D<f64, Tracker>,
        top_left: Point3D<f64, Tracker>,
        top_right: Point3D<f64, Tracker>,
        width: f64,
        height: f64,
    ) -> Result<ScreenPlane, Error> {
        if !(width > 0.0 && height > 0.0) {
            return Err(Error::DegenerateScreen);
        }

        let top_mid = top_left.lerp(top_right, 0.5);
        let bottom_mid = bottom_left.lerp(bottom_right, 0.5);
        let center = top_mid.lerp(bottom_mid, 0.5);

        let across = top_right - top_left;
        let down = bottom_left - top_left;
        let normal = across.cross(down);
        if normal.square_length() <= f64::EPSILON
            || across.square_length() <= f64::EPSILON
            || down.square_length() <= f64::EPSILON
        {
            return Err(Error::DegenerateScreen);
        }
        let (u, v, n) = (across.normalize(), down.normalize(), normal.normalize());

        // Row vectors: a plane-local (u, v, n) maps to u * U + v * V + n * N + top_left.
        #[rustfmt::skip]
        let from_plane: Transform3D<f64, Plane, Tracker> = Transform3D::new(
            u.x, u.y, u.z, 0.0,
            v.x, v.y, v.z, 0.0,
            n.x, n.y, n.z, 0.0,
            top_left.x, top_left.y, top_left.z, 1.0,
        );
        let to_plane = from_plane.inverse().ok_or(Error::DegenerateScreen)?;
        let origin = to_plane
            .transform_point3d(top_left)
            .ok_or(Error::DegenerateScreen)?
            .xy();

        Ok(ScreenPlane {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            width,
            height,
            center,
            normal: n,
            to_plane,
            origin,
        })
    }

    pub fn center(&self) -> Point3D<f64, Tracker> {
        self.center
    }

    /// The unit normal, along `(top_right - top_left) x (bottom_left - top_left)`.
    pub fn normal(&self) -> Vector3D<f64, Tracker> {
        self.normal
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Intersects the ray `origin + t * direction` with the plane.
    /// Returns `None` when the ray runs parallel to the plane or is not a number.
    pub fn intersect(
        &self,
        origin: Point3D<f64, Tracker>,
        direction: Vector3D<f64, Tracker>,
    ) -> Option<Point3D<f64, Tracker>> {
        let denominator = -direction.dot(self.normal);
        if !(denominator.abs() >= PARALLEL_EPSILON) {
            return None;
        }
        let t = self.normal.dot(origin - self.top_left) / denominator;
        Some(origin + direction * t)
    }

    /// Raw in-plane coordinates of a tracker point.
    pub fn project(&self, point: Point3D<f64, Tracker>) -> Point2D<f64, Plane> {
        // The basis is affine, so the homogeneous w is always 1.
        self.to_plane
            .transform_point3d(point)
            .map(|p| p.xy())
            .unwrap_or_else(|| Point2D::new(f64::NAN, f64::NAN))
    }

    /// Display-fraction coordinates of a tracker point: the top-left corner
    /// lands on (0, 0) and the bottom-right corner on (1, 1).
    pub fn project_normalized(&self, point: Point3D<f64, Tracker>) -> Point2D<f64, Display> {
        let offset = self.project(point) - self.origin;
        Point2D::new(offset.x / self.width, offset.y / self.height)
    }
}
