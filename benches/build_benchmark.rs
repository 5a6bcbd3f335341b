//! Benchmarks for tree construction and serialization.
//!
//! Run with: cargo bench

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ipnet::{IpNet, Ipv4Net};
use mmdb_writer::{Options, Tree, Value};

/// Generate `count` disjoint /24 networks with small map records.
fn generate_networks(count: u32) -> Vec<(IpNet, Value)> {
    (0..count)
        .map(|i| {
            let addr = std::net::Ipv4Addr::from((i << 8) | (10 << 24));
            let network = IpNet::V4(Ipv4Net::new(addr, 24).unwrap());

            let mut record = BTreeMap::new();
            record.insert(
                "country".to_string(),
                Value::from(if i % 2 == 0 { "US" } else { "DE" }),
            );
            record.insert("asn".to_string(), Value::Uint32(i % 1024));
            (network, Value::Map(record))
        })
        .collect()
}

fn build_tree(networks: &[(IpNet, Value)]) -> Tree {
    let mut tree = Tree::new(Options {
        build_epoch: Some(1_700_000_000),
        database_type: "Bench".to_string(),
        ..Options::default()
    })
    .unwrap();
    for (network, value) in networks {
        tree.insert(*network, value.clone()).unwrap();
    }
    tree
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for count in [1_000u32, 10_000] {
        let networks = generate_networks(count);
        group.throughput(Throughput::Elements(u64::from(count)));
        group.bench_with_input(
            BenchmarkId::from_parameter(count),
            &networks,
            |b, networks| b.iter(|| black_box(build_tree(networks))),
        );
    }
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    for count in [1_000u32, 10_000] {
        let networks = generate_networks(count);
        let mut tree = build_tree(&networks);
        tree.finalize();
        group.bench_with_input(BenchmarkId::from_parameter(count), &tree, |b, tree| {
            b.iter(|| {
                let mut out = Vec::with_capacity(1 << 20);
                tree.write_to(&mut out).unwrap();
                black_box(out)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_write);
criterion_main!(benches);
