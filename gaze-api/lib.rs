/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! This crate defines the Rust API for gaze projection and drift compensation.
//! Tracker backends are implemented by the `gaze` crate.

mod config;
mod device;
mod display;
mod drift;
mod error;
mod events;
mod fixation;
mod frame;
mod mock;
mod projector;
mod registry;
mod sample;
mod screen;
mod session;
mod space;

pub use config::FixationConfig;
pub use config::SessionInit;

pub use device::Device;
pub use device::Discovery;

pub use display::DisplayArea;

pub use drift::rotation_between;
pub use drift::DriftCompensator;
pub use drift::DriftState;

pub use error::Error;

pub use events::Event;
pub use events::EventBuffer;

pub use fixation::dispersion;
pub use fixation::is_fixation;
pub use fixation::max_deviation;
pub use fixation::normalized_threshold;

pub use frame::Frame;
pub use frame::FrameUpdateEvent;
pub use frame::GazeFrame;

pub use mock::MockDeviceInit;
pub use mock::MockDeviceMsg;
pub use mock::MockDiscovery;

pub use projector::apply;
pub use projector::DriftCompensatedPoint;

pub use registry::MainThreadRegistry;
pub use registry::Registry;

pub use sample::combine;
pub use sample::EyeData;
pub use sample::GazeSample;
pub use sample::Validated;

pub use screen::ScreenPlane;

pub use session::HighResTimeStamp;
pub use session::MainThreadSession;
pub use session::Quitter;
pub use session::Session;
pub use session::SessionBuilder;
pub use session::SessionMode;
pub use session::SessionThread;

pub use space::Display;
pub use space::Plane;
pub use space::Tracker;

use std::time::Duration;

#[cfg(feature = "ipc")]
use std::thread;

#[cfg(feature = "ipc")]
pub use ipc_channel::ipc::IpcSender as Sender;

#[cfg(feature = "ipc")]
pub use ipc_channel::ipc::IpcReceiver as Receiver;

#[cfg(feature = "ipc")]
pub fn channel<T>() -> Result<(Sender<T>, Receiver<T>), Error>
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    ipc_channel::ipc::channel().or(Err(Error::CommunicationError))
}

pub use crossbeam_channel::RecvTimeoutError;

#[cfg(not(feature = "ipc"))]
pub use crossbeam_channel::{Receiver, Sender};

#[cfg(not(feature = "ipc"))]
pub fn channel<T>() -> Result<(Sender<T>, Receiver<T>), Error> {
    Ok(crossbeam_channel::unbounded())
}

#[cfg(not(feature = "ipc"))]
pub fn recv_timeout<T>(receiver: &Receiver<T>, timeout: Duration) -> Result<T, RecvTimeoutError> {
    receiver.recv_timeout(timeout)
}

#[cfg(feature = "ipc")]
pub fn recv_timeout<T>(receiver: &Receiver<T>, timeout: Duration) -> Result<T, RecvTimeoutError>
where
    T: serde::Serialize + for<'a> serde::Deserialize<'a>,
{
    use ipc_channel::ipc::TryRecvError;

    // Sigh, polling, sigh.
    let mut delay = timeout / 1000;
    while delay < timeout {
        match receiver.try_recv() {
            Ok(msg) => return Ok(msg),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::IpcError(_)) => return Err(RecvTimeoutError::Disconnected),
        }
        thread::sleep(delay);
        delay = delay * 2;
    }
    match receiver.try_recv() {
        Ok(msg) => Ok(msg),
        Err(TryRecvError::Empty) => Err(RecvTimeoutError::Timeout),
        Err(TryRecvError::IpcError(_)) => Err(RecvTimeoutError::Disconnected),
    }
}
