/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// Errors that can be produced by gaze sessions and their geometry.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub enum Error {
    NoMatchingDevice,
    CommunicationError,
    ThreadCreationError,
    /// The display corners do not span a plane.
    DegenerateScreen,
    InvalidConfig(String),
    BackendSpecific(String),
}
