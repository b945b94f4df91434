/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use euclid::Point2D;
use euclid::Point3D;

use gaze::headless::HeadlessMockDiscovery;

use gaze_api::DisplayArea;
use gaze_api::Error;
use gaze_api::Event;
use gaze_api::EyeData;
use gaze_api::GazeFrame;
use gaze_api::GazeSample;
use gaze_api::MainThreadRegistry;
use gaze_api::MockDeviceInit;
use gaze_api::MockDeviceMsg;
use gaze_api::Receiver;
use gaze_api::Sender;
use gaze_api::Session;
use gaze_api::SessionInit;
use gaze_api::SessionMode;
use gaze_api::Tracker;
use gaze_api::Validated;

use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);
const FIXATION_SAMPLES: usize = 5;

fn eye(origin: Point3D<f64, Tracker>, point: Point3D<f64, Tracker>) -> EyeData {
    EyeData::new(
        Validated::valid(Point2D::new(0.5, 0.5)),
        Some(Validated::valid(point)),
        Some(Validated::valid(origin)),
        Some(Validated::valid(3.0)),
    )
}

// The user looks at the center of a display whose center sits at height
// `center_y`, but the tracker reports a point 20mm to the right of it.
fn drifted_sample_at(timestamp: f64, center_y: f64) -> GazeSample {
    let reported = Point3D::new(20.0, center_y, 0.0);
    GazeSample::new(
        timestamp,
        eye(Point3D::new(-30.0, center_y, 600.0), reported),
        eye(Point3D::new(30.0, center_y, 600.0), reported),
    )
}

fn drifted_sample(timestamp: f64) -> GazeSample {
    drifted_sample_at(timestamp, 145.0)
}

struct Harness {
    // Kept alive for the duration of the test.
    _main: MainThreadRegistry,
    session: Session,
    device: Sender<MockDeviceMsg>,
    events: Receiver<Event>,
    frames: Receiver<GazeFrame>,
}

fn connect(init: SessionInit) -> Harness {
    let mut main = MainThreadRegistry::new().unwrap();
    main.register_mock(HeadlessMockDiscovery::new());
    let mut registry = main.registry();

    let (sender, receiver) = gaze_api::channel().unwrap();
    registry.simulate_device_connection(
        MockDeviceInit {
            display_area: DisplayArea::upright(520.0, 290.0),
            mode: SessionMode::EyeTracker,
            fixation_sample_count: FIXATION_SAMPLES,
        },
        sender,
    );
    main.run_one_frame();
    let device = receiver.recv().unwrap().unwrap();

    let (sender, receiver) = gaze_api::channel().unwrap();
    registry.request_session(SessionMode::EyeTracker, init, sender);
    main.run_one_frame();
    let mut session = receiver.recv().unwrap().unwrap();
    assert_eq!(session.mode(), SessionMode::EyeTracker);

    let (sender, events) = gaze_api::channel().unwrap();
    session.set_event_dest(sender);
    let (sender, frames) = gaze_api::channel().unwrap();
    session.set_frame_dest(sender);

    Harness {
        _main: main,
        session,
        device,
        events,
        frames,
    }
}

fn expect_event(events: &Receiver<Event>, expected: fn(&Event) -> bool) -> Event {
    loop {
        let event = gaze_api::recv_timeout(events, WAIT).expect("timed out waiting for event");
        if expected(&event) {
            return event;
        }
    }
}

fn expect_frame(frames: &Receiver<GazeFrame>, timestamp: f64) -> GazeFrame {
    loop {
        let frame = gaze_api::recv_timeout(frames, WAIT).expect("timed out waiting for frame");
        if frame.sample.timestamp == timestamp {
            return frame;
        }
    }
}

#[test]
fn fixation_on_center_compensates_drift() {
    let mut harness = connect(SessionInit::default());

    harness.device.send(MockDeviceMsg::PushSample(drifted_sample(1.0))).unwrap();
    let before = expect_frame(&harness.frames, 1.0);
    let point = before.display_point().unwrap();
    assert!((point.x - 280.0 / 520.0).abs() < 1e-9);
    assert!((point.y - 0.5).abs() < 1e-9);

    harness.session.start_drift_compensation();
    expect_event(&harness.events, |e| *e == Event::DriftCompensationStarted);

    for i in 0..FIXATION_SAMPLES {
        let sample = drifted_sample(10.0 + i as f64);
        harness.device.send(MockDeviceMsg::PushSample(sample)).unwrap();
    }
    let state = match expect_event(&harness.events, |e| matches!(e, Event::DriftCompensated(_))) {
        Event::DriftCompensated(state) => state,
        _ => unreachable!(),
    };
    assert_eq!(state.timestamp, 10.0 + (FIXATION_SAMPLES - 1) as f64);
    assert!(state.correction_degrees() > 1.0);

    harness.device.send(MockDeviceMsg::PushSample(drifted_sample(100.0))).unwrap();
    let after = expect_frame(&harness.frames, 100.0);
    let compensated = after.compensated.unwrap();
    assert!((compensated.point_2d.x - 0.5).abs() < 1e-6);
    assert!((compensated.point_2d.y - 0.5).abs() < 1e-6);
    assert!(compensated.point_3d.z.abs() < 1e-6);

    harness.session.end_session();
    expect_event(&harness.events, |e| *e == Event::SessionEnd);
}

#[test]
fn drift_compensation_times_out_without_fixation() {
    let mut harness = connect(SessionInit::default());

    harness
        .session
        .start_drift_compensation_with_timeout(Some(Duration::from_millis(50)));
    expect_event(&harness.events, |e| *e == Event::DriftCompensationStarted);
    expect_event(&harness.events, |e| *e == Event::DriftCompensationTimedOut);

    // Samples after the timeout are projected but no longer collected.
    harness.device.send(MockDeviceMsg::PushSample(drifted_sample(1.0))).unwrap();
    let frame = expect_frame(&harness.frames, 1.0);
    let point = frame.compensated.unwrap().point_2d;
    assert!((point.x - 280.0 / 520.0).abs() < 1e-9);

    harness.session.end_session();
    expect_event(&harness.events, |e| *e == Event::SessionEnd);
}

#[test]
fn reset_drops_compensation() {
    let mut harness = connect(SessionInit::default());

    harness.session.start_drift_compensation();
    expect_event(&harness.events, |e| *e == Event::DriftCompensationStarted);
    for i in 0..FIXATION_SAMPLES {
        let sample = drifted_sample(i as f64);
        harness.device.send(MockDeviceMsg::PushSample(sample)).unwrap();
    }
    expect_event(&harness.events, |e| matches!(e, Event::DriftCompensated(_)));

    harness.session.reset_drift_compensation();
    expect_event(&harness.events, |e| *e == Event::DriftCompensationReset);

    harness.device.send(MockDeviceMsg::PushSample(drifted_sample(50.0))).unwrap();
    let frame = expect_frame(&harness.frames, 50.0);
    let point = frame.compensated.unwrap().point_2d;
    assert!((point.x - 280.0 / 520.0).abs() < 1e-9);
}

#[test]
fn display_area_change_is_reported() {
    let mut harness = connect(SessionInit::default());
    let moved = DisplayArea::upright(600.0, 340.0);

    harness.device.send(MockDeviceMsg::SetDisplayArea(moved)).unwrap();
    let event = expect_event(&harness.events, |e| matches!(e, Event::DisplayAreaChanged(_)));
    assert_eq!(event, Event::DisplayAreaChanged(moved));

    harness.session.apply_event(&event);
    assert_eq!(harness.session.display_area(), moved);

    // Frames are projected onto the new plane.
    harness.device.send(MockDeviceMsg::PushSample(drifted_sample(1.0))).unwrap();
    let point = expect_frame(&harness.frames, 1.0).compensated.unwrap().point_2d;
    assert!((point.x - 320.0 / 600.0).abs() < 1e-9);
    assert!((point.y - 195.0 / 340.0).abs() < 1e-9);
}

#[test]
fn display_area_change_retargets_drift_compensation() {
    let mut harness = connect(SessionInit::default());

    harness.session.start_drift_compensation();
    expect_event(&harness.events, |e| *e == Event::DriftCompensationStarted);
    for i in 0..(FIXATION_SAMPLES - 2) {
        let sample = drifted_sample(i as f64);
        harness.device.send(MockDeviceMsg::PushSample(sample)).unwrap();
    }

    // The new display is centered at (0, 170, 0).
    let moved = DisplayArea::upright(600.0, 340.0);
    harness.device.send(MockDeviceMsg::SetDisplayArea(moved)).unwrap();
    expect_event(&harness.events, |e| matches!(e, Event::DisplayAreaChanged(_)));

    for i in 0..FIXATION_SAMPLES {
        let sample = drifted_sample_at(10.0 + i as f64, 170.0);
        harness.device.send(MockDeviceMsg::PushSample(sample)).unwrap();
    }
    expect_event(&harness.events, |e| matches!(e, Event::DriftCompensated(_)));

    let sample = drifted_sample_at(100.0, 170.0);
    harness.device.send(MockDeviceMsg::PushSample(sample)).unwrap();
    let compensated = expect_frame(&harness.frames, 100.0).compensated.unwrap();
    assert!((compensated.point_2d.x - 0.5).abs() < 1e-6);
    assert!((compensated.point_2d.y - 0.5).abs() < 1e-6);
    assert!((compensated.point_3d - Point3D::new(0.0, 170.0, 0.0)).length() < 1e-6);
}

#[test]
fn disconnect_ends_session() {
    let harness = connect(SessionInit::default());

    let (sender, receiver) = gaze_api::channel().unwrap();
    harness.device.send(MockDeviceMsg::Disconnect(sender)).unwrap();
    gaze_api::recv_timeout(&receiver, WAIT).unwrap();
    expect_event(&harness.events, |e| *e == Event::SessionEnd);
}

#[test]
fn mouse_request_does_not_match_eye_tracker_mock() {
    let mut main = MainThreadRegistry::new().unwrap();
    main.register_mock(HeadlessMockDiscovery::new());
    let mut registry = main.registry();

    let (sender, receiver) = gaze_api::channel().unwrap();
    registry.simulate_device_connection(
        MockDeviceInit {
            display_area: DisplayArea::upright(520.0, 290.0),
            mode: SessionMode::EyeTracker,
            fixation_sample_count: FIXATION_SAMPLES,
        },
        sender,
    );
    main.run_one_frame();
    receiver.recv().unwrap().unwrap();

    assert!(main.supports_session(SessionMode::EyeTracker));
    assert!(!main.supports_session(SessionMode::Mouse));
    let result = main.request_session(SessionMode::Mouse, &SessionInit::default());
    assert_eq!(result.err(), Some(Error::NoMatchingDevice));
}

#[test]
fn invalid_init_is_rejected() {
    let mut main = MainThreadRegistry::new().unwrap();
    let mut init = SessionInit::default();
    init.fixation.dispersion_threshold_deg = 0.0;
    match main.request_session(SessionMode::EyeTracker, &init) {
        Err(Error::InvalidConfig(_)) => {}
        other => panic!("unexpected result {:?}", other.err()),
    }
}
