//! Criterion benchmarks for the photo pipeline.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use jirolog::photo::{
    encode_data_url, file_to_data_url, transform_image, ImageAction, ImageEditState, ImageOptions,
    Rotation,
};

fn photo_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Rotate + crop at typical phone-photo sizes.
fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for (w, h) in [(640, 480), (1280, 960), (1600, 1200)].iter() {
        let data_url = encode_data_url("image/png", &photo_bytes(*w, *h));
        group.throughput(Throughput::Elements((*w * *h) as u64));

        group.bench_with_input(
            BenchmarkId::new("rotate_crop", format!("{w}x{h}")),
            &data_url,
            |b, data_url| {
                let options = ImageOptions {
                    rotation: Rotation::Quarter,
                    crop: true,
                    ..ImageOptions::default()
                };
                b.iter(|| black_box(transform_image(data_url, &options).len()));
            },
        );
    }

    group.finish();
}

/// Picking an oversized file: decode, bound, re-encode.
fn bench_file_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_ingest");

    let bytes = photo_bytes(3000, 2000);
    for max in [800u32, 1600].iter() {
        group.bench_with_input(BenchmarkId::new("bound", max), max, |b, &max| {
            let options = ImageOptions {
                max_dimension: Some(max),
                ..ImageOptions::default()
            };
            b.iter(|| black_box(file_to_data_url(&bytes, "image/png", &options).len()));
        });
    }

    group.finish();
}

/// A burst of edits, each re-rendered from the original.
fn bench_edit_session(c: &mut Criterion) {
    let data_url = encode_data_url("image/png", &photo_bytes(1280, 960));
    let defaults = ImageOptions::default();

    c.bench_function("edit_session", |b| {
        b.iter(|| {
            let mut state = ImageEditState::new(data_url.clone());
            let mut last = 0;
            for action in [
                ImageAction::RotateRight,
                ImageAction::ToggleCrop,
                ImageAction::RotateLeft,
                ImageAction::Reset,
            ] {
                state.apply(action);
                last = state.render(&defaults).len();
            }
            black_box(last)
        });
    });
}

criterion_group!(benches, bench_transform, bench_file_ingest, bench_edit_session);
criterion_main!(benches);
