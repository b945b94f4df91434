/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

/// Traits to be implemented by backends
use crate::DisplayArea;
use crate::Error;
use crate::Frame;
use crate::Quitter;
use crate::Session;
use crate::SessionBuilder;
use crate::SessionMode;

/// A trait for discovering gaze trackers
pub trait Discovery: 'static {
    fn request_session(
        &mut self,
        mode: SessionMode,
        builder: SessionBuilder,
    ) -> Result<Session, Error>;
    fn supports_session(&self, mode: SessionMode) -> bool;
}

/// A trait for using a gaze tracker
pub trait Device: 'static {
    /// The display geometry in tracker coordinates.
    fn display_area(&self) -> DisplayArea;

    /// How many samples make up a fixation, at the device's frame rate.
    fn fixation_sample_count(&self) -> usize;

    /// This method should block waiting for the next frame,
    /// and return the information for it. Returning `None`
    /// means the device is gone and ends the session.
    ///
    /// Drift compensation deadlines are only checked between frames, so a
    /// device with no sample ready should still return an empty `Frame`
    /// within a few milliseconds rather than block indefinitely.
    fn wait_for_frame(&mut self) -> Option<Frame>;

    /// The session is ending; release the tracker.
    fn quit(&mut self);

    fn set_quitter(&mut self, quitter: Quitter);
}
