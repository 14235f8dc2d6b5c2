use detector_grid::GridError;
use detector_grid::api::{AnimationTiming, FrameOutcome, GridAnimation, GridRenderOptions, render_grid};
use detector_grid::core::{ChannelKey, ChannelMapping, GridPosition, RenderedFactors, Viewport};
use image::AnimationDecoder;
use image::codecs::gif::{GifDecoder, Repeat};

fn small_frame(value: f64) -> FrameOutcome {
    let mapping = ChannelMapping::from_cells(
        "fta",
        [(ChannelKey::from_label("A0:CH01"), GridPosition::new(0.0, 0.0))],
    );
    let mut factors = RenderedFactors::new();
    factors.insert(ChannelKey::from_label("A0:CH01"), value);
    let options = GridRenderOptions::new("ageing_factor").with_viewport(Viewport::new(320, 240));
    FrameOutcome::new(format!("date-{value}"), render_grid(&mapping, &factors, &options))
}

fn failed_frame(date: &str) -> FrameOutcome {
    FrameOutcome::new(date, Err(GridError::InvalidData("boom".to_owned())))
}

#[test]
fn timing_maps_loop_count_to_gif_repeat() {
    assert!(matches!(AnimationTiming::new(500, 0).repeat(), Repeat::Infinite));
    assert!(matches!(AnimationTiming::new(500, 3).repeat(), Repeat::Finite(3)));
    assert_eq!(AnimationTiming::default(), AnimationTiming::new(500, 0));
}

#[test]
fn failed_frames_are_skipped() {
    let animation = GridAnimation::from_outcomes(
        vec![small_frame(0.5), failed_frame("2024-01-31"), small_frame(0.9)],
        AnimationTiming::default(),
    )
    .expect("two frames survive");

    assert_eq!(animation.len(), 2);
    assert_eq!(animation.dates(), ["date-0.5", "date-0.9"]);
    assert_eq!(animation.skipped_dates(), ["2024-01-31"]);
}

#[test]
fn all_frames_failing_is_an_error() {
    let err = GridAnimation::from_outcomes(
        vec![failed_frame("a"), failed_frame("b")],
        AnimationTiming::default(),
    )
    .expect_err("nothing rendered");
    assert!(matches!(err, GridError::NoFrames));

    let err = GridAnimation::from_outcomes(Vec::new(), AnimationTiming::default())
        .expect_err("no outcomes");
    assert!(matches!(err, GridError::NoFrames));
}

#[test]
fn encoded_gif_keeps_frame_count_and_delay() {
    let animation = GridAnimation::from_outcomes(
        vec![small_frame(0.5), small_frame(0.7), small_frame(1.1)],
        AnimationTiming::new(250, 2),
    )
    .expect("animation");
    let bytes = animation.to_gif_bytes().expect("encode");
    assert!(bytes.starts_with(b"GIF89a"));

    let decoder = GifDecoder::new(bytes.as_slice()).expect("decode header");
    let frames = decoder.into_frames().collect_frames().expect("decode frames");
    assert_eq!(frames.len(), 3);
    let (numer, denom) = frames[0].delay().numer_denom_ms();
    assert_eq!(numer / denom, 250);
    assert_eq!(frames[0].buffer().dimensions(), (320, 240));
}

#[test]
fn save_writes_gif_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ageing.gif");
    let animation = GridAnimation::from_outcomes(vec![small_frame(0.6)], AnimationTiming::default())
        .expect("animation");
    animation.save(&path).expect("save");

    let bytes = std::fs::read(&path).expect("read gif");
    assert!(bytes.starts_with(b"GIF89a"));
}
