use criterion::{Criterion, criterion_group, criterion_main};
use detector_grid::api::{GridRenderOptions, render_grid};
use detector_grid::core::{
    ChannelKey, ChannelMapping, ExampleDataConfig, GridPosition, Viewport, extract_factors,
    generate_example_data,
};
use detector_grid::render::{NullRenderer, Renderer};
use std::hint::black_box;

fn bench_key_normalization(c: &mut Criterion) {
    let labels: Vec<(String, String)> = (0..1_000)
        .map(|i| (format!("pma{}", i % 40), format!("Ch{}", i % 64 + 1)))
        .collect();

    c.bench_function("key_normalization_1k", |b| {
        b.iter(|| {
            for (module, channel) in &labels {
                black_box(ChannelKey::normalize(module, channel));
            }
        })
    });
}

fn bench_extract_and_layout(c: &mut Criterion) {
    let config = ExampleDataConfig::for_detector("fta")
        .with_shape(12, 40, 64)
        .with_seed(1);
    let document = generate_example_data(&config).expect("valid example data");
    let mapping = ChannelMapping::from_cells(
        "fta",
        (0..40).flat_map(|module| {
            (1..=64).map(move |channel| {
                (
                    ChannelKey::normalize(&format!("A{module}"), &format!("CH{channel}")),
                    GridPosition::new(f64::from(channel / 8), f64::from(module * 8 + channel % 8)),
                )
            })
        }),
    );
    let options = GridRenderOptions::new("normalized_gauss_ageing_factor")
        .with_viewport(Viewport::new(1920, 1080));

    c.bench_function("extract_factors_2560_channels", |b| {
        b.iter(|| black_box(extract_factors(&document, None, "normalized_gauss_ageing_factor")))
    });

    let factors = extract_factors(&document, None, "normalized_gauss_ageing_factor");
    c.bench_function("grid_layout_2560_cells", |b| {
        b.iter(|| {
            let image = render_grid(&mapping, &factors, &options).expect("grid");
            let mut renderer = NullRenderer::default();
            renderer.render(image.frame()).expect("valid frame");
            black_box(renderer.last_rect_count)
        })
    });
}

criterion_group!(benches, bench_key_normalization, bench_extract_and_layout);
criterion_main!(benches);
