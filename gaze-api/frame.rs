/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::Display;
use crate::DisplayArea;
use crate::DriftCompensatedPoint;
use crate::GazeSample;

use euclid::Point2D;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// The per-frame data that is provided by the device.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// The sample for this frame, if the device produced one in time
    pub sample: Option<GazeSample>,
    /// Events that need to be applied before the sample
    pub events: Vec<FrameUpdateEvent>,
}

#[derive(Clone, Debug)]
pub enum FrameUpdateEvent {
    UpdateDisplayArea(DisplayArea),
}

/// The per-sample output of a session.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct GazeFrame {
    pub sample: GazeSample,
    /// The drift-compensated point, when the sample could be compensated
    pub compensated: Option<DriftCompensatedPoint>,
}

impl GazeFrame {
    /// The compensated point, falling back to the tracker's own combined 2D point.
    pub fn display_point(&self) -> Option<Point2D<f64, Display>> {
        match self.compensated {
            Some(ref compensated) => Some(compensated.point_2d),
            None => self.sample.combined.gaze_point_2d.get().copied(),
        }
    }
}
