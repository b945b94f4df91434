/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::Discovery;
use crate::DisplayArea;
use crate::Error;
use crate::GazeSample;
use crate::Receiver;
use crate::Sender;
use crate::SessionMode;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// A trait for discovering mock gaze trackers
pub trait MockDiscovery: 'static {
    fn simulate_device_connection(
        &mut self,
        init: MockDeviceInit,
        receiver: Receiver<MockDeviceMsg>,
    ) -> Result<Box<dyn Discovery>, Error>;
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct MockDeviceInit {
    pub display_area: DisplayArea,
    /// The kind of tracker the mock pretends to be.
    pub mode: SessionMode,
    pub fixation_sample_count: usize,
}

#[derive(Debug)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub enum MockDeviceMsg {
    /// Queue a sample; samples are delivered in the order they were pushed.
    PushSample(GazeSample),
    SetDisplayArea(DisplayArea),
    Disconnect(Sender<()>),
}
