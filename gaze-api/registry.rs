/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use crate::Discovery;
use crate::Error;
use crate::MainThreadSession;
use crate::MockDeviceInit;
use crate::MockDeviceMsg;
use crate::MockDiscovery;
use crate::Receiver;
use crate::Sender;
use crate::Session;
use crate::SessionBuilder;
use crate::SessionInit;
use crate::SessionMode;

use log::info;
use log::warn;

#[cfg(feature = "ipc")]
use serde::{Deserialize, Serialize};

#[derive(Clone)]
#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
pub struct Registry {
    sender: Sender<RegistryMsg>,
}

pub struct MainThreadRegistry {
    discoveries: Vec<Box<dyn Discovery>>,
    sessions: Vec<Box<dyn MainThreadSession>>,
    mock: Option<Box<dyn MockDiscovery>>,
    sender: Sender<RegistryMsg>,
    receiver: Receiver<RegistryMsg>,
}

impl Registry {
    pub fn supports_session(&mut self, mode: SessionMode, dest: Sender<bool>) {
        let _ = self.sender.send(RegistryMsg::SupportsSession(mode, dest));
    }

    pub fn request_session(
        &mut self,
        mode: SessionMode,
        init: SessionInit,
        dest: Sender<Result<Session, Error>>,
    ) {
        let _ = self
            .sender
            .send(RegistryMsg::RequestSession(mode, init, dest));
    }

    pub fn simulate_device_connection(
        &mut self,
        init: MockDeviceInit,
        dest: Sender<Result<Sender<MockDeviceMsg>, Error>>,
    ) {
        let _ = self
            .sender
            .send(RegistryMsg::SimulateDeviceConnection(init, dest));
    }
}

impl MainThreadRegistry {
    pub fn new() -> Result<MainThreadRegistry, Error> {
        let (sender, receiver) = crate::channel()?;
        let discoveries = Vec::new();
        let sessions = Vec::new();
        let mock = None;
        Ok(MainThreadRegistry {
            discoveries,
            sessions,
            mock,
            sender,
            receiver,
        })
    }

    pub fn registry(&self) -> Registry {
        Registry {
            sender: self.sender.clone(),
        }
    }

    /// Discoveries are tried in registration order.
    pub fn register<D: Discovery>(&mut self, discovery: D) {
        self.discoveries.push(Box::new(discovery));
    }

    pub fn register_mock<D: MockDiscovery>(&mut self, discovery: D) {
        self.mock = Some(Box::new(discovery));
    }

    pub fn run_on_main_thread<S: MainThreadSession>(&mut self, session: S) {
        self.sessions.push(Box::new(session));
    }

    pub fn run_one_frame(&mut self) {
        while let Ok(msg) = self.receiver.try_recv() {
            self.handle_msg(msg);
        }
        for session in &mut self.sessions {
            session.run_one_frame();
        }
        self.sessions.retain(|session| session.running());
    }

    pub fn running(&self) -> bool {
        self.sessions.iter().any(|session| session.running())
    }

    pub fn supports_session(&self, mode: SessionMode) -> bool {
        self.discoveries
            .iter()
            .any(|discovery| discovery.supports_session(mode))
    }

    /// Requests a session from the first discovery that can provide one.
    /// An eye tracker request falls back to the mouse when `init` allows it.
    pub fn request_session(
        &mut self,
        mode: SessionMode,
        init: &SessionInit,
    ) -> Result<Session, Error> {
        init.validate()?;
        match self.request_session_for_mode(mode, init) {
            Err(Error::NoMatchingDevice)
                if mode == SessionMode::EyeTracker && init.allow_mouse_fallback =>
            {
                warn!("No eye tracker available, falling back to the mouse");
                self.request_session_for_mode(SessionMode::Mouse, init)
            }
            result => result,
        }
    }

    fn request_session_for_mode(
        &mut self,
        mode: SessionMode,
        init: &SessionInit,
    ) -> Result<Session, Error> {
        for discovery in &mut self.discoveries {
            if !discovery.supports_session(mode) {
                continue;
            }
            let builder = SessionBuilder::new(&mut self.sessions, mode, init.clone());
            match discovery.request_session(mode, builder) {
                Ok(session) => {
                    info!("Started {:?} session", mode);
                    return Ok(session);
                }
                Err(err) => warn!("Gaze discovery failed to start a session ({:?})", err),
            }
        }
        Err(Error::NoMatchingDevice)
    }

    fn simulate_device_connection(
        &mut self,
        init: MockDeviceInit,
    ) -> Result<Sender<MockDeviceMsg>, Error> {
        let mock = self.mock.as_mut().ok_or(Error::NoMatchingDevice)?;
        let (sender, receiver) = crate::channel()?;
        let discovery = mock.simulate_device_connection(init, receiver)?;
        self.discoveries.insert(0, discovery);
        Ok(sender)
    }

    fn handle_msg(&mut self, msg: RegistryMsg) {
        match msg {
            RegistryMsg::SupportsSession(mode, dest) => {
                let _ = dest.send(self.supports_session(mode));
            }
            RegistryMsg::RequestSession(mode, init, dest) => {
                let _ = dest.send(self.request_session(mode, &init));
            }
            RegistryMsg::SimulateDeviceConnection(init, dest) => {
                let _ = dest.send(self.simulate_device_connection(init));
            }
        }
    }
}

#[cfg_attr(feature = "ipc", derive(Serialize, Deserialize))]
enum RegistryMsg {
    RequestSession(SessionMode, SessionInit, Sender<Result<Session, Error>>),
    SupportsSession(SessionMode, Sender<bool>),
    SimulateDeviceConnection(MockDeviceInit, Sender<Result<Sender<MockDeviceMsg>, Error>>),
}
