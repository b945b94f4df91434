/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! This crate uses `euclid`'s typed units, and exposes different coordinate spaces.

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// The 3D user coordinate system of the tracker, measured in millimetres.
/// Gaze origins, 3D gaze points and the display corners all live here.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub enum Tracker {}

/// Coordinates in the plane of the display, with an arbitrary origin,
/// measured in the same linear unit as `Tracker`.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub enum Plane {}

/// The normalized display coordinate space, where the display
/// is from (0,0) at the top left to (1,1) at the bottom right.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub enum Display {}
