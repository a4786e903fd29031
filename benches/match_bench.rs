//! Matching and loading benchmarks over a synthetic dataset

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use device_pattern::{detect, load_from_bytes, DataSet, DataSetWriter};

const PRODUCTS: usize = 200;
const VERSIONS: usize = 40;

/// One component, `PRODUCTS` products with `VERSIONS` numeric versions each
fn create_test_data(compress: bool) -> Vec<u8> {
    let mut writer = DataSetWriter::new().with_compression(compress);
    let browser = writer.add_component("Browser");
    let name = writer.add_property("BrowserName", browser).unwrap();
    let version = writer.add_property("BrowserVersion", browser).unwrap();

    let mut profile_id = 1;
    for p in 0..PRODUCTS {
        let product = format!("Product{:03}/", p);
        let name_value = writer.add_value(name, &product[..10]).unwrap();
        for v in 0..VERSIONS {
            let number = (100 + v * 3).to_string();
            let version_value = writer.add_value(version, &number).unwrap();
            let profile = writer
                .add_profile(profile_id, browser, &[name_value, version_value])
                .unwrap();
            profile_id += 1;
            let nodes = writer
                .add_path(
                    browser,
                    &[(0, "Mozilla/5.0 ("), (13, product.as_str()), (24, number.as_str())],
                )
                .unwrap();
            writer.add_signature(&nodes, &[profile]).unwrap();
        }
    }

    writer.finalize().unwrap()
}

fn load_dataset() -> DataSet {
    load_from_bytes(&create_test_data(false), &[] as &[&str]).unwrap()
}

fn benchmark_match(c: &mut Criterion) {
    let dataset = load_dataset();
    let inputs = [
        ("exact", "Mozilla/5.0 (Product150/136 like Gecko)"),
        ("numeric", "Mozilla/5.0 (Product150/137 like Gecko)"),
        ("closest", "Mozilla/5.0 (Product150/x36 like Gecko)"),
        ("none", "curl/8.4.0"),
    ];

    let mut group = c.benchmark_group("match");
    for (label, input) in inputs {
        group.bench_with_input(BenchmarkId::from_parameter(label), input, |b, input| {
            b.iter(|| detect(black_box(&dataset), black_box(input)))
        });
    }
    group.finish();
}

fn benchmark_long_input(c: &mut Criterion) {
    let dataset = load_dataset();
    let input = format!("Mozilla/5.0 (Product010/100 {}", "x".repeat(64 * 1024));

    c.bench_function("match_long_input", |b| {
        b.iter(|| detect(black_box(&dataset), black_box(&input)))
    });
}

fn benchmark_load(c: &mut Criterion) {
    let plain = create_test_data(false);
    let packed = create_test_data(true);

    let mut group = c.benchmark_group("load");
    group.bench_function("uncompressed", |b| {
        b.iter(|| load_from_bytes(black_box(&plain), &[] as &[&str]).unwrap())
    });
    group.bench_function("compressed", |b| {
        b.iter(|| load_from_bytes(black_box(&packed), &[] as &[&str]).unwrap())
    });
    group.finish();
}

criterion_group!(benches, benchmark_match, benchmark_long_input, benchmark_load);
criterion_main!(benches);
