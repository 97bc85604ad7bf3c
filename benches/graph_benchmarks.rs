use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use stratagraph::codec;
use stratagraph::{ElementKind, Graph, GraphConfig, PropertyValue};

/// Benchmark value encoding and decoding
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let values = [
        PropertyValue::String("Person12345".to_string()),
        PropertyValue::Integer(-42),
        PropertyValue::Float(3.25),
        PropertyValue::Array(vec![1i64.into(), "x".into()]),
    ];
    for value in values {
        let name = value.type_name();
        group.bench_with_input(BenchmarkId::new("encode", name), &value, |b, v| {
            b.iter(|| codec::encode(black_box(v)).unwrap())
        });
        let bytes = codec::encode(&value).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", name), &bytes, |b, bytes| {
            b.iter(|| codec::decode(black_box(bytes)).unwrap())
        });
    }
    group.finish();
}

/// Benchmark vertex insertion throughput
fn bench_vertex_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("vertex_insertion");

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let config = GraphConfig::in_memory("bench").set_auto_flush(false);
                let graph = Graph::open(config).unwrap();
                for i in 0..size {
                    let mut vertex = graph.add_vertex(None).unwrap();
                    graph
                        .set_property(&mut vertex, "name", format!("Person{}", i))
                        .unwrap();
                }
                graph.flush().unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark indexed versus scanned property lookup
fn bench_property_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("property_lookup");

    for indexed in [false, true] {
        let graph = Graph::open(GraphConfig::in_memory("bench")).unwrap();
        if indexed {
            graph.create_key_index("age", ElementKind::Vertex).unwrap();
        }
        for i in 0..1000i64 {
            let mut vertex = graph.add_vertex(None).unwrap();
            graph.set_property(&mut vertex, "age", i % 100).unwrap();
        }
        let name = if indexed { "indexed" } else { "scan" };
        group.bench_function(name, |b| {
            b.iter(|| graph.vertices_with("age", black_box(42i64)).unwrap().count())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_codec,
    bench_vertex_insertion,
    bench_property_lookup
);
criterion_main!(benches);
