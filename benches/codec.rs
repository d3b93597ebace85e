use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hopwire::protocol::{compute_checksum, decode, encode};
use hopwire::{HEADER_SIZE, MessageBuffer, RECORD_HEADER_SIZE, WireRecord};

/// One record filling the whole region.
fn filled(region: usize) -> MessageBuffer {
    let mut message = MessageBuffer::create(HEADER_SIZE + region).unwrap();
    let payload = u16::try_from(region - RECORD_HEADER_SIZE).unwrap();
    message
        .append_record(&WireRecord::new(1, payload).unwrap())
        .unwrap();
    message
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for size in [64usize, 1024, 60 * 1024] {
        let message = filled(size);
        group.throughput(Throughput::Bytes(message.len() as u64));
        group.bench_with_input(BenchmarkId::new("encode", size), &message, |b, message| {
            b.iter(|| black_box(encode(message)));
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    for size in [64usize, 1024, 60 * 1024] {
        let encoded = encode(&filled(size));
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, encoded| {
            b.iter(|| black_box(decode(encoded).unwrap()));
        });
    }

    group.finish();
}

fn bench_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("records");

    // 64 small records
    let record = WireRecord::new(2, 12).unwrap();
    let region = 64 * record.encoded_len();
    group.bench_function("append_64", |b| {
        b.iter(|| {
            let mut message = MessageBuffer::create(HEADER_SIZE + region).unwrap();
            for _ in 0..64 {
                message.append_record(black_box(&record)).unwrap();
            }
            black_box(message);
        });
    });

    let mut message = MessageBuffer::create(HEADER_SIZE + region).unwrap();
    for _ in 0..64 {
        message.append_record(&record).unwrap();
    }
    group.bench_function("last_record_64", |b| {
        b.iter(|| black_box(message.last_record().unwrap().len()));
    });

    group.finish();
}

fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");

    let message = filled(1024);
    group.throughput(Throughput::Bytes(message.len() as u64));
    group.bench_function("xxh3_1kb", |b| {
        b.iter(|| black_box(compute_checksum(&message)));
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_records, bench_checksum);
criterion_main!(benches);
