use image::{Rgba as Pixel, RgbaImage};
use motiontrail::{
    CaptureError, ConfigError, EffectConfig, EffectController, ParameterWrite, RecordingSink,
    Resolution, Rgba, Section, TickOutcome, DELAY_FRAMES_PARAM,
};

const WIDTH: u32 = 6;
const HEIGHT: u32 = 4;

fn distinct_frame(seed: u8) -> RgbaImage {
    RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        Pixel([seed, x as u8, y as u8, 255])
    })
}

fn trail_config(delay_count: usize) -> EffectConfig {
    EffectConfig {
        resolution: Resolution::new(WIDTH, HEIGHT),
        max_color: Rgba::new(1.0, 0.0, 0.0, 1.0),
        sections: vec![
            Section::new(Rgba::new(1.0, 0.5, 0.0, 1.0), 0.1),
            Section::new(Rgba::new(0.0, 0.0, 1.0, 0.25), 0.9),
        ],
        delay_count,
    }
}

#[test]
fn seven_ticks_over_three_slots() {
    let mut controller = EffectController::new(trail_config(3)).unwrap();
    let mut sink = RecordingSink::new();
    let frames: Vec<RgbaImage> = (0..7).map(distinct_frame).collect();

    let mut written = Vec::new();
    for frame in &frames {
        match controller.tick(frame, &mut sink) {
            TickOutcome::Captured { slot } => written.push(slot),
            other => panic!("unexpected tick outcome {other:?}"),
        }
    }

    assert_eq!(written, vec![0, 1, 2, 0, 1, 2, 0]);
    assert_eq!(controller.current_index(), 1);

    let uploads: Vec<(&str, &[u8])> = sink
        .frame_uploads()
        .map(|write| match write {
            ParameterWrite::Frame { name, pixels, .. } => (name.as_str(), pixels.as_slice()),
            _ => unreachable!(),
        })
        .collect();
    let expected_names = [
        "_Frame0", "_Frame1", "_Frame2", "_Frame0", "_Frame1", "_Frame2", "_Frame0",
    ];
    assert_eq!(uploads.len(), frames.len());
    for ((name, pixels), (expected, frame)) in uploads.iter().zip(expected_names.iter().zip(&frames)) {
        assert_eq!(name, expected);
        assert_eq!(*pixels, frame.as_raw().as_slice());
    }

    // F6 overwrote slot 0, F4 and F5 still live in slots 1 and 2.
    let ring = controller.ring();
    assert_eq!(ring.slot_at(0).unwrap().pixels(), frames[6].as_raw().as_slice());
    assert_eq!(ring.slot_at(1).unwrap().pixels(), frames[4].as_raw().as_slice());
    assert_eq!(ring.slot_at(2).unwrap().pixels(), frames[5].as_raw().as_slice());
    assert!(ring.slots()[3..].iter().all(|slot| slot.captures() == 0));
}

#[test]
fn live_toggle_takes_effect_on_next_tick() {
    let mut controller = EffectController::new(trail_config(0)).unwrap();
    let mut sink = RecordingSink::new();

    assert_eq!(controller.tick(&distinct_frame(0), &mut sink), TickOutcome::Disabled);
    controller.set_delay_count(2).unwrap();
    assert_eq!(
        controller.tick(&distinct_frame(1), &mut sink),
        TickOutcome::Captured { slot: 0 }
    );
    assert_eq!(
        sink.last(DELAY_FRAMES_PARAM),
        Some(&ParameterWrite::Int {
            name: DELAY_FRAMES_PARAM.to_string(),
            value: 2,
        })
    );

    controller.set_delay_count(0).unwrap();
    sink.take();
    assert_eq!(controller.tick(&distinct_frame(2), &mut sink), TickOutcome::Disabled);
    assert_eq!(sink.frame_uploads().count(), 0);
    assert_eq!(
        sink.last(DELAY_FRAMES_PARAM),
        Some(&ParameterWrite::Int {
            name: DELAY_FRAMES_PARAM.to_string(),
            value: 0,
        })
    );
}

#[test]
fn resolution_mismatch_is_recovered_without_reinitialising() {
    let mut controller = EffectController::new(trail_config(2)).unwrap();
    let mut sink = RecordingSink::new();

    controller.tick(&distinct_frame(1), &mut sink);
    let oversized = RgbaImage::new(WIDTH * 2, HEIGHT);
    for _ in 0..3 {
        let outcome = controller.tick(&oversized, &mut sink);
        assert_eq!(
            outcome,
            TickOutcome::Skipped(CaptureError::ResolutionMismatch {
                expected: Resolution::new(WIDTH, HEIGHT),
                actual: Resolution::new(WIDTH * 2, HEIGHT),
            })
        );
    }
    assert_eq!(controller.ticks(), 4);
    assert_eq!(sink.frame_uploads().count(), 1);

    assert_eq!(
        controller.tick(&distinct_frame(2), &mut sink),
        TickOutcome::Captured { slot: 1 }
    );
    assert_eq!(
        controller.ring().slot_at(1).unwrap().pixels(),
        distinct_frame(2).as_raw().as_slice()
    );
}

#[test]
fn over_limit_delay_never_starts() {
    assert_eq!(
        EffectController::new(trail_config(11)).unwrap_err(),
        ConfigError::DelayOutOfRange(11)
    );
}

#[test]
fn oversized_image_container_is_captured_without_panicking() {
    let mut controller = EffectController::new(EffectConfig {
        resolution: Resolution::new(2, 2),
        delay_count: 2,
        ..EffectConfig::default()
    })
    .unwrap();
    let mut sink = RecordingSink::new();
    let source = RgbaImage::from_raw(2, 2, vec![7u8; 20]).unwrap();

    assert_eq!(
        controller.tick(&source, &mut sink),
        TickOutcome::Captured { slot: 0 }
    );
    assert_eq!(controller.ring().slot_at(0).unwrap().pixels(), [7u8; 16].as_slice());
    assert_eq!(controller.current_index(), 1);
}
