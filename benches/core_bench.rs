//! Benchmarks for synthstack core operations.
//!
//! Run with: cargo bench
//!
//! Results include 95% confidence intervals via Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use synthstack::core::resolver::{topological_order, ReferenceGraph};
use synthstack::core::types::{DocumentFormat, InstanceConfig, StackConfig};
use synthstack::core::{parser, synth};
use synthstack::units::hello_stack;

const STACK: &str = r#"
version: "1.0"
name: bench
project: BenchStack
provider:
  region: ap-northeast-1
vpc:
  cidr: 10.0.0.0/16
  azs: [ap-northeast-1a, ap-northeast-1c]
  private_subnets: [10.0.1.0/24, 10.0.2.0/24]
  public_subnets: [10.0.101.0/24, 10.0.102.0/24]
"#;

fn stack_with(instances: usize) -> StackConfig {
    let mut config = parser::parse_config(STACK).unwrap();
    config.instances = (0..instances)
        .map(|i| InstanceConfig {
            name: format!("node-{i:03}"),
            subnet_index: i % 2,
            instance_type: "t2.micro".to_string(),
        })
        .collect();
    config
}

fn bench_blake3_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("blake3_string");
    for size in [64, 1024, 16384] {
        let input: String = "x".repeat(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| {
                let hash = blake3::hash(black_box(input.as_bytes()));
                black_box(hash);
            });
        });
    }
    group.finish();
}

fn bench_config_parse(c: &mut Criterion) {
    c.bench_function("parse_config", |b| {
        b.iter(|| {
            let config = parser::parse_config(black_box(STACK)).unwrap();
            black_box(config);
        });
    });
}

fn bench_compose_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_synthesize");
    for n in [1, 10, 50] {
        let config = stack_with(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &config, |b, config| {
            b.iter(|| {
                let tree = hello_stack::compose(black_box(config)).unwrap();
                let json = synth::synthesize_to_string(&tree, DocumentFormat::Json).unwrap();
                black_box(json);
            });
        });
    }
    group.finish();
}

fn bench_topo_sort(c: &mut Criterion) {
    // Linear chain of N nodes, inserted in reverse so ordering has work to do
    let mut group = c.benchmark_group("topo_sort");
    for n in [10, 100, 1000] {
        let mut graph = ReferenceGraph::default();
        let names: Vec<String> = (0..n).map(|i| format!("node-{i:04}")).collect();
        for i in (0..n).rev() {
            let deps: Vec<&str> = if i > 0 { vec![names[i - 1].as_str()] } else { vec![] };
            graph.insert(&names[i], &deps);
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &graph, |b, graph| {
            b.iter(|| {
                let order = topological_order(black_box(graph)).unwrap();
                black_box(order);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_blake3_string,
    bench_config_parse,
    bench_compose_synthesize,
    bench_topo_sort
);
criterion_main!(benches);
