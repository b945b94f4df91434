/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use gaze_api::Device;
use gaze_api::Discovery;
use gaze_api::DisplayArea;
use gaze_api::Error;
use gaze_api::Frame;
use gaze_api::FrameUpdateEvent;
use gaze_api::GazeSample;
use gaze_api::MockDeviceInit;
use gaze_api::MockDeviceMsg;
use gaze_api::MockDiscovery;
use gaze_api::Quitter;
use gaze_api::Receiver;
use gaze_api::Session;
use gaze_api::SessionBuilder;
use gaze_api::SessionMode;

use log::debug;

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

// How long the device waits for a pushed sample before reporting an empty frame.
const FRAME_TIMEOUT: Duration = Duration::from_millis(5);

pub struct HeadlessMockDiscovery {}

struct HeadlessDiscovery {
    data: Arc<HeadlessShared>,
    mode: SessionMode,
}

struct HeadlessDevice {
    data: Arc<HeadlessShared>,
}

struct HeadlessShared {
    data: Mutex<HeadlessDeviceData>,
    pushed: Condvar,
}

struct HeadlessDeviceData {
    display_area: DisplayArea,
    fixation_sample_count: usize,
    samples: VecDeque<GazeSample>,
    display_area_changes: Vec<DisplayArea>,
    quitter: Option<Quitter>,
    disconnected: bool,
}

impl MockDiscovery for HeadlessMockDiscovery {
    fn simulate_device_connection(
        &mut self,
        init: MockDeviceInit,
        receiver: Receiver<MockDeviceMsg>,
    ) -> Result<Box<dyn Discovery>, Error> {
        init.display_area.screen_plane()?;
        let data = HeadlessDeviceData {
            display_area: init.display_area,
            fixation_sample_count: init.fixation_sample_count,
            samples: VecDeque::new(),
            display_area_changes: vec![],
            quitter: None,
            disconnected: false,
        };
        let data = Arc::new(HeadlessShared {
            data: Mutex::new(data),
            pushed: Condvar::new(),
        });
        let data_ = data.clone();

        thread::Builder::new()
            .name("gaze-headless".into())
            .spawn(move || {
                run_loop(receiver, data_);
            })
            .or(Err(Error::ThreadCreationError))?;
        Ok(Box::new(HeadlessDiscovery {
            data,
            mode: init.mode,
        }))
    }
}

fn run_loop(receiver: Receiver<MockDeviceMsg>, data: Arc<HeadlessShared>) {
    while let Ok(msg) = receiver.recv() {
        let keep_going = data.lock().handle_msg(msg);
        data.pushed.notify_all();
        if !keep_going {
            break;
        }
    }
}

impl HeadlessShared {
    fn lock(&self) -> MutexGuard<HeadlessDeviceData> {
        // A poisoned lock only means a test panicked; the data is still usable.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Discovery for HeadlessDiscovery {
    fn request_session(
        &mut self,
        mode: SessionMode,
        builder: SessionBuilder,
    ) -> Result<Session, Error> {
        if !self.supports_session(mode) {
            return Err(Error::NoMatchingDevice);
        }
        let data = self.data.clone();
        builder.spawn(move || Ok(HeadlessDevice { data }))
    }

    fn supports_session(&self, mode: SessionMode) -> bool {
        !self.data.lock().disconnected && mode == self.mode
    }
}

impl Device for HeadlessDevice {
    fn display_area(&self) -> DisplayArea {
        self.data.lock().display_area
    }

    fn fixation_sample_count(&self) -> usize {
        self.data.lock().fixation_sample_count
    }

    fn wait_for_frame(&mut self) -> Option<Frame> {
        let mut data = self.data.lock();
        if data.samples.is_empty() && data.display_area_changes.is_empty() && !data.disconnected {
            data = match self.data.pushed.wait_timeout(data, FRAME_TIMEOUT) {
                Ok((data, _)) => data,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        if data.disconnected && data.samples.is_empty() {
            return None;
        }
        let events = data
            .display_area_changes
            .drain(..)
            .map(FrameUpdateEvent::UpdateDisplayArea)
            .collect();
        Some(Frame {
            sample: data.samples.pop_front(),
            events,
        })
    }

    fn quit(&mut self) {
        debug!("Headless device released");
    }

    fn set_quitter(&mut self, quitter: Quitter) {
        self.data.lock().quitter = Some(quitter);
    }
}

impl HeadlessMockDiscovery {
    pub fn new() -> HeadlessMockDiscovery {
        HeadlessMockDiscovery {}
    }
}

impl HeadlessDeviceData {
    fn handle_msg(&mut self, msg: MockDeviceMsg) -> bool {
        match msg {
            MockDeviceMsg::PushSample(sample) => {
                self.samples.push_back(sample);
            }
            MockDeviceMsg::SetDisplayArea(display_area) => {
                self.display_area = display_area;
                self.display_area_changes.push(display_area);
            }
            MockDeviceMsg::Disconnect(s) => {
                self.disconnected = true;
                if let Some(ref quitter) = self.quitter {
                    quitter.quit();
                }
                // notify the client that we're done disconnecting
                let _ = s.send(());
                return false;
            }
        }
        true
    }
}
