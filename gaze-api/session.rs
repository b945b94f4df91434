/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::projector;
use crate::Device;
use crate::DisplayArea;
use crate::DriftCompensator;
use crate::Error;
use crate::Event;
use crate::EventBuffer;
use crate::Frame;
use crate::FrameUpdateEvent;
use crate::GazeFrame;
use crate::Receiver;
use crate::ScreenPlane;
use crate::Sender;
use crate::SessionInit;

use log::debug;
use log::error;
use log::info;
use log::warn;

use std::thread;
use std::time::Duration;
use std::time::Instant;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

/// Which kind of tracker drives the session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub enum SessionMode {
    /// A binocular eye tracker, with 3D gaze data.
    EyeTracker,
    /// The system mouse standing in for gaze, 2D only.
    Mouse,
}

/// Device timestamp, in milliseconds.
pub type HighResTimeStamp = f64;

// The messages that are sent from the control thread to the session thread.
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
enum SessionMsg {
    SetEventDest(Sender<Event>),
    SetFrameDest(Sender<GazeFrame>),
    StartDriftCompensation(Option<Duration>),
    ResetDriftCompensation,
    Quit,
}

#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
#[derive(Clone)]
pub struct Quitter {
    sender: Sender<SessionMsg>,
}

impl Quitter {
    pub fn quit(&self) {
        let _ = self.sender.send(SessionMsg::Quit);
    }
}

/// A handle to a gaze session, owned by the control thread.
///
/// All drift compensation state lives on the session thread; this handle
/// only sends it commands, so it can be cloned and used from any thread.
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
#[derive(Clone)]
pub struct Session {
    mode: SessionMode,
    display_area: DisplayArea,
    drift_timeout: Option<Duration>,
    sender: Sender<SessionMsg>,
}

impl Session {
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn display_area(&self) -> DisplayArea {
        self.display_area
    }

    /// Starts looking for a fixation on the display center, giving up after
    /// the session's configured timeout.
    pub fn start_drift_compensation(&mut self) {
        let timeout = self.drift_timeout;
        self.start_drift_compensation_with_timeout(timeout);
    }

    pub fn start_drift_compensation_with_timeout(&mut self, timeout: Option<Duration>) {
        let _ = self.sender.send(SessionMsg::StartDriftCompensation(timeout));
    }

    pub fn reset_drift_compensation(&mut self) {
        let _ = self.sender.send(SessionMsg::ResetDriftCompensation);
    }

    pub fn set_event_dest(&mut self, dest: Sender<Event>) {
        let _ = self.sender.send(SessionMsg::SetEventDest(dest));
    }

    /// Every sample from now on is sent here, drift compensated when possible.
    pub fn set_frame_dest(&mut self, dest: Sender<GazeFrame>) {
        let _ = self.sender.send(SessionMsg::SetFrameDest(dest));
    }

    pub fn end_session(&mut self) {
        let _ = self.sender.send(SessionMsg::Quit);
    }

    pub fn apply_event(&mut self, event: &Event) {
        if let Event::DisplayAreaChanged(display_area) = *event {
            self.display_area = display_area;
        }
    }
}

/// For devices that want to do their own thread management, the `SessionThread` type is exposed.
///
/// The session thread is the single owner of the screen plane and the drift
/// compensator. Commands from `Session` handles are drained around each
/// device frame, so they are serialized with the sample stream.
pub struct SessionThread<D> {
    receiver: Receiver<SessionMsg>,
    sender: Sender<SessionMsg>,
    mode: SessionMode,
    drift_timeout: Option<Duration>,
    screen: ScreenPlane,
    drift: DriftCompensator,
    drift_deadline: Option<Instant>,
    events: EventBuffer,
    frame_dest: Option<Sender<GazeFrame>>,
    running: bool,
    device: D,
}

impl<D: Device> SessionThread<D> {
    pub fn new(
        mut device: D,
        mode: SessionMode,
        init: &SessionInit,
    ) -> Result<SessionThread<D>, Error> {
        init.validate()?;
        let (sender, receiver) = crate::channel()?;
        device.set_quitter(Quitter {
            sender: sender.clone(),
        });
        let screen = device.display_area().screen_plane()?;
        let sample_count = init.sample_count(device.fixation_sample_count());
        let drift = DriftCompensator::for_screen(
            &screen,
            sample_count,
            init.fixation.dispersion_threshold_deg,
        );
        info!(
            "Gaze session ({:?}): fixation of {} samples within {} degrees",
            mode, sample_count, init.fixation.dispersion_threshold_deg
        );
        Ok(SessionThread {
            sender,
            receiver,
            mode,
            drift_timeout: init.drift_timeout,
            screen,
            drift,
            drift_deadline: None,
            events: Default::default(),
            frame_dest: None,
            running: true,
            device,
        })
    }

    pub fn new_session(&mut self) -> Session {
        Session {
            mode: self.mode,
            display_area: self.device.display_area(),
            drift_timeout: self.drift_timeout,
            sender: self.sender.clone(),
        }
    }

    pub fn run(&mut self) {
        while self.running {
            self.handle_pending_msgs();
            if self.running {
                self.poll_device();
            }
        }
        debug!("Gaze session thread finished");
    }

    /// The compensator, for devices that drive the session themselves.
    pub fn drift(&self) -> &DriftCompensator {
        &self.drift
    }

    pub fn screen(&self) -> &ScreenPlane {
        &self.screen
    }

    fn handle_pending_msgs(&mut self) {
        while let Ok(msg) = self.receiver.try_recv() {
            if !self.handle_msg(msg) {
                self.end();
                return;
            }
        }
    }

    fn handle_msg(&mut self, msg: SessionMsg) -> bool {
        match msg {
            SessionMsg::SetEventDest(dest) => {
                self.events.upgrade(dest);
            }
            SessionMsg::SetFrameDest(dest) => {
                self.frame_dest = Some(dest);
            }
            SessionMsg::StartDriftCompensation(timeout) => {
                if self.drift.start() {
                    self.drift_deadline = timeout.map(|timeout| Instant::now() + timeout);
                    self.events.callback(Event::DriftCompensationStarted);
                } else {
                    debug!("Drift compensation already collecting");
                }
            }
            SessionMsg::ResetDriftCompensation => {
                self.drift.reset();
                self.drift_deadline = None;
                self.events.callback(Event::DriftCompensationReset);
            }
            SessionMsg::Quit => {
                self.device.quit();
                return false;
            }
        }
        true
    }

    fn poll_device(&mut self) {
        let frame = self.device.wait_for_frame();
        // Commands sent while the device was blocked apply to this frame.
        self.handle_pending_msgs();
        if !self.running {
            return;
        }
        match frame {
            Some(frame) => self.handle_frame(frame),
            None => {
                info!("Gaze device went away");
                self.end();
                return;
            }
        }
        self.check_drift_deadline();
    }

    fn handle_frame(&mut self, frame: Frame) {
        for event in frame.events {
            match event {
                FrameUpdateEvent::UpdateDisplayArea(display_area) => {
                    self.update_display_area(display_area)
                }
            }
        }

        if let Some(sample) = frame.sample {
            if let Some(state) = self.drift.update(&sample) {
                self.drift_deadline = None;
                self.events.callback(Event::DriftCompensated(state));
            }
            if let Some(ref dest) = self.frame_dest {
                let compensated = projector::apply(&sample, &self.drift.rotation(), &self.screen);
                let _ = dest.send(GazeFrame {
                    sample,
                    compensated,
                });
            }
        }
    }

    fn update_display_area(&mut self, display_area: DisplayArea) {
        match display_area.screen_plane() {
            Ok(screen) => {
                info!("Display area changed, centered at {:?}", screen.center());
                self.drift.set_fixation_point(screen.center());
                self.screen = screen;
                self.events
                    .callback(Event::DisplayAreaChanged(display_area));
            }
            Err(err) => warn!("Ignoring display area update ({:?})", err),
        }
    }

    fn check_drift_deadline(&mut self) {
        let expired = match self.drift_deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        };
        if !expired {
            return;
        }
        self.drift_deadline = None;
        if self.drift.is_collecting() {
            warn!("No fixation found before the drift compensation timeout");
            self.drift.cancel();
            self.events.callback(Event::DriftCompensationTimedOut);
        }
    }

    fn end(&mut self) {
        if self.running {
            self.running = false;
            self.events.callback(Event::SessionEnd);
        }
    }
}

/// Devices that need to can run sessions on the main thread.
pub trait MainThreadSession: 'static {
    fn run_one_frame(&mut self);
    fn running(&self) -> bool;
}

impl<D: Device> MainThreadSession for SessionThread<D> {
    fn run_one_frame(&mut self) {
        self.handle_pending_msgs();
        if self.running {
            self.poll_device();
        }
    }

    fn running(&self) -> bool {
        self.running
    }
}

/// A type for building gaze sessions
pub struct SessionBuilder<'a> {
    sessions: &'a mut Vec<Box<dyn MainThreadSession>>,
    mode: SessionMode,
    init: SessionInit,
}

impl<'a> SessionBuilder<'a> {
    pub fn new(
        sessions: &'a mut Vec<Box<dyn MainThreadSession>>,
        mode: SessionMode,
        init: SessionInit,
    ) -> SessionBuilder<'a> {
        SessionBuilder {
            sessions,
            mode,
            init,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn init(&self) -> &SessionInit {
        &self.init
    }

    /// For devices which are happy to hand over thread management to gaze.
    pub fn spawn<D, F>(self, factory: F) -> Result<Session, Error>
    where
        F: 'static + FnOnce() -> Result<D, Error> + Send,
        D: Device,
    {
        let (acks, ackr) = crate::channel()?;
        let mode = self.mode;
        let init = self.init;
        thread::Builder::new()
            .name("gaze-session".into())
            .spawn(move || {
                match factory().and_then(|device| SessionThread::new(device, mode, &init)) {
                    Ok(mut thread) => {
                        let session = thread.new_session();
                        let _ = acks.send(Ok(session));
                        thread.run();
                    }
                    Err(err) => {
                        error!("Failed to start gaze session ({:?})", err);
                        let _ = acks.send(Err(err));
                    }
                }
            })
            .or(Err(Error::ThreadCreationError))?;
        ackr.recv().unwrap_or(Err(Error::CommunicationError))
    }

    /// For devices that need to run on the main thread.
    pub fn run_on_main_thread<D, F>(self, factory: F) -> Result<Session, Error>
    where
        F: 'static + FnOnce() -> Result<D, Error>,
        D: Device,
    {
        let device = factory()?;
        let mut session_thread = SessionThread::new(device, self.mode, &self.init)?;
        let session = session_thread.new_session();
        self.sessions.push(Box::new(session_thread));
        Ok(session)
    }
}
