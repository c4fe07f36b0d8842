//! Integration tests: drive a whole session the way the browser driver
//! does, executing nothing but recording every command.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use keyout_session::{
    Command, MemorySurface, PointerPosition, RenderedBounds, SessionOrchestrator, SessionState,
};

/// A 400x300 PNG, mid-grey except pixel (10, 10) = RGB(12, 200, 44).
fn photo_png() -> Vec<u8> {
    let img = image::RgbaImage::from_fn(400, 300, |x, y| {
        if (x, y) == (10, 10) {
            image::Rgba([12, 200, 44, 255])
        } else {
            image::Rgba([128, 128, 128, 255])
        }
    });
    let mut buf = Vec::new();
    image::ImageEncoder::write_image(
        image::codecs::png::PngEncoder::new(&mut buf),
        img.as_raw(),
        400,
        300,
        image::ExtendedColorType::Rgba8,
    )
    .unwrap();
    buf
}

/// Where the page renders the photo: natural size, offset by the layout.
const BOUNDS: RenderedBounds = RenderedBounds {
    left: 32.0,
    top: 120.0,
    width: 400.0,
    height: 300.0,
};

/// Client coordinates of local pixel (x, y) in [`BOUNDS`].
fn local(x: f64, y: f64) -> PointerPosition {
    PointerPosition {
        x: BOUNDS.left + x + 0.5,
        y: BOUNDS.top + y + 0.5,
    }
}

fn payloads(commands: &[Command]) -> Vec<serde_json::Value> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::Send { payload, .. } => Some(serde_json::from_str(payload).unwrap()),
            _ => None,
        })
        .collect()
}

/// Select `photo.png`, acknowledge the upload and open the channel.
fn connected() -> SessionOrchestrator<MemorySurface> {
    let mut orch = SessionOrchestrator::new(MemorySurface::new());
    orch.select_file("photo.png", photo_png()).unwrap();
    let upload = orch.take_commands();
    assert!(matches!(
        upload.as_slice(),
        [Command::Upload { file_name, .. }] if file_name == "photo.png"
    ));

    let generation = orch.generation();
    orch.upload_finished(generation, Ok(()));
    assert_eq!(orch.take_commands(), vec![Command::Open { generation }]);
    orch.channel_opened(generation);
    assert_eq!(orch.state(), SessionState::AwaitingColor);
    orch
}

#[test]
fn photo_click_sends_default_parameters_and_shows_result() {
    let mut orch = connected();
    let dims = orch.image().unwrap().dimensions();
    assert_eq!((dims.width, dims.height), (400, 300));

    let color = orch.click(local(10.0, 10.0), BOUNDS).unwrap();
    assert_eq!(color.to_string(), "12,200,44");
    assert!(orch.is_processing());

    let commands = orch.take_commands();
    let sent = payloads(&commands);
    assert_eq!(sent.len(), 1);
    let msg = &sent[0];
    assert_eq!(msg["tolerance"], 30);
    assert!((msg["blur_radius"].as_f64().unwrap() - 2.0).abs() < f64::EPSILON);
    assert_eq!(msg["mode"], "simple");
    assert_eq!(msg["refine"], false);
    assert_eq!(msg["color"], "12,200,44");

    // blur_radius goes out as a real number.
    match &commands[0] {
        Command::Send { payload, .. } => assert!(payload.contains("\"blur_radius\":2.0")),
        other => panic!("expected a send, got {other:?}"),
    }

    orch.result_received(orch.generation(), b"\x89PNG result");
    assert_eq!(orch.state(), SessionState::Ready);
    assert!(!orch.is_processing());
    assert_eq!(orch.result_bytes(), Some(&b"\x89PNG result"[..]));
    // The source image and exactly one result are live.
    assert_eq!(orch.surface().live_handles(), 2);
}

#[test]
fn rapid_tolerance_changes_send_one_message_each() {
    let mut orch = connected();
    orch.click(local(10.0, 10.0), BOUNDS).unwrap();
    orch.take_commands();

    for value in [35, 40, 45] {
        orch.set_tolerance(value);
        assert_eq!(orch.state(), SessionState::Processing);
    }

    let sent = payloads(&orch.take_commands());
    let tolerances: Vec<_> = sent.iter().map(|m| m["tolerance"].as_u64().unwrap()).collect();
    assert_eq!(tolerances, vec![35, 40, 45]);
    assert_eq!(orch.session().unwrap().requests_sent(), 4);

    // Any single result returns to Ready, whichever request it answers.
    orch.result_received(orch.generation(), b"first back");
    assert_eq!(orch.state(), SessionState::Ready);
    assert!(!orch.is_processing());
}

#[test]
fn reapplying_same_value_sends_nothing() {
    let mut orch = connected();
    orch.click(local(10.0, 10.0), BOUNDS).unwrap();
    orch.set_tolerance(45);
    orch.take_commands();

    orch.set_tolerance(45);
    orch.set_blur_radius(2.0);
    orch.click(local(10.0, 10.0), BOUNDS).unwrap();
    assert!(orch.take_commands().is_empty());
}

#[test]
fn click_outside_image_changes_nothing() {
    let mut orch = connected();
    orch.click(local(10.0, 10.0), BOUNDS).unwrap();
    orch.take_commands();

    let misses = [
        PointerPosition { x: 10.0, y: 10.0 },
        PointerPosition {
            x: BOUNDS.left + BOUNDS.width,
            y: BOUNDS.top + 1.0,
        },
        PointerPosition {
            x: BOUNDS.left + 1.0,
            y: BOUNDS.top + BOUNDS.height + 3.0,
        },
    ];
    for miss in misses {
        assert!(orch.click(miss, BOUNDS).is_none());
    }

    assert_eq!(orch.seed_color().unwrap().to_string(), "12,200,44");
    assert!(orch.take_commands().is_empty());
}

#[test]
fn new_file_while_processing_discards_result_and_restarts() {
    let mut orch = connected();
    orch.click(local(10.0, 10.0), BOUNDS).unwrap();
    orch.result_received(orch.generation(), b"old result");
    orch.set_tolerance(60);
    assert_eq!(orch.state(), SessionState::Processing);
    let old_generation = orch.generation();
    orch.take_commands();

    orch.select_file("second.png", photo_png()).unwrap();

    assert_eq!(orch.state(), SessionState::Uploading);
    assert!(orch.result().is_none());
    assert!(!orch.is_processing());
    assert_eq!(orch.surface().live_handles(), 1);

    let commands = orch.take_commands();
    assert_eq!(
        commands[0],
        Command::Close {
            generation: old_generation
        }
    );

    // The answer to the old request arrives late and is dropped.
    orch.result_received(old_generation, b"late");
    assert!(orch.result().is_none());
    assert_eq!(orch.surface().live_handles(), 1);

    // Parameters survive the new session; the seed color does not.
    assert_eq!(orch.parameters().tolerance, 60);
    assert!(orch.seed_color().is_none());
}
