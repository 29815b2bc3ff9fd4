//! Record codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recordkit_bench::random_people;
use recordkit_value::{decode_record, encode_record, Record, Value};

/// Create a record with nested arrays and maps.
fn nested_record(depth: usize, width: usize) -> Record {
    fn nested(depth: usize, width: usize) -> Value {
        if depth == 0 {
            Value::Text("leaf".into())
        } else {
            Value::Array((0..width).map(|_| nested(depth - 1, width)).collect())
        }
    }
    let mut record = Record::new();
    for i in 0..width {
        record.insert(format!("key_{}", i), nested(depth, width));
    }
    record
}

/// Benchmark encoding records.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let person = random_people(1).remove(0);
    group.bench_function("person", |b| {
        b.iter(|| encode_record(black_box(&person)).unwrap());
    });

    for depth in [1, 2, 3].iter() {
        let record = nested_record(*depth, 4);
        group.bench_with_input(BenchmarkId::new("nested", depth), &record, |b, record| {
            b.iter(|| encode_record(black_box(record)).unwrap());
        });
    }
    group.finish();
}

/// Benchmark decoding records.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let bytes = encode_record(&random_people(1).remove(0)).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("person", |b| {
        b.iter(|| decode_record(black_box(&bytes)).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
