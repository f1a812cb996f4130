use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageBuffer, Rgba};
use resizedrop::processing::{data_uri, encode, Resampler};
use resizedrop::ImageFormat;

fn photo(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 255) as u8, (y % 255) as u8, ((x * y) % 255) as u8, 255])
    }))
}

fn benchmark_resize(c: &mut Criterion) {
    let source = photo(1920, 1080);
    let resampler = Resampler::new();

    c.bench_function("resize 1920x1080 to 35x30", |b| {
        b.iter(|| resampler.resize(black_box(&source), 35, 30));
    });

    let small = resampler.resize(&source, 35, 30);
    c.bench_function("encode 35x30 png data uri", |b| {
        b.iter(|| {
            let bytes = encode(black_box(&small), ImageFormat::Png, 100).unwrap();
            data_uri::encode(ImageFormat::Png.mime_type(), &bytes)
        });
    });

    let uri = data_uri::encode("image/png", &encode(&small, ImageFormat::Png, 100).unwrap());
    c.bench_function("decode 35x30 png data uri", |b| {
        b.iter(|| data_uri::decode(black_box(&uri)).unwrap());
    });
}

criterion_group!(benches, benchmark_resize);
criterion_main!(benches);
