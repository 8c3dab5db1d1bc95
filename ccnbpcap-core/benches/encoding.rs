use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ccnbpcap_core::{
    capture::CaptureWriter,
    ccnb::content_object,
    content::extract_content,
    driver::{process_buffer, DriverConfig},
    frame::{encode_frame, FrameConfig},
};

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");
    let config = FrameConfig::default();

    for size in [256, 1024, 4096, 16384] {
        let payload = vec![0x42u8; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, data| {
            b.iter(|| encode_frame(black_box(data), &config).unwrap());
        });
    }

    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_content");

    for size in [256, 1024, 4096, 16384] {
        let record = content_object(&[b"ccnx.org", b"bench"], &vec![0x42u8; size]);

        group.throughput(Throughput::Bytes(record.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &record, |b, data| {
            b.iter(|| extract_content(black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_buffer");

    let mut buffer = Vec::new();
    for i in 0..100u32 {
        let seq = i.to_be_bytes();
        buffer.extend_from_slice(&content_object(&[b"ccnx.org", &seq], &[0x42u8; 1024]));
    }

    group.throughput(Throughput::Bytes(buffer.len() as u64));
    group.bench_function("100x1KB", |b| {
        b.iter(|| {
            let mut writer = CaptureWriter::loopback(Vec::with_capacity(200_000)).unwrap();
            process_buffer(black_box(&buffer), &DriverConfig::default(), &mut writer).unwrap();
            writer.close().unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_extract, bench_process);
criterion_main!(benches);
