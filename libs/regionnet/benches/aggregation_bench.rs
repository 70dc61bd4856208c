use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use regionnet::core::links::policy::UNIFORM_LINK;
use regionnet::{ElementType, InputSpec, Network, OutputSpec, RegionSpec, SplitPolicy};

/// Benchmark: Input::prepare() across link counts
///
/// One link is the zero-copy path; more links copy every source buffer into
/// the aggregated input buffer on each step.

const ELEMENTS_PER_LINK: usize = 4096;

fn build(links: usize) -> Network {
    let mut net = Network::new();
    net.add_region(
        &RegionSpec::new("consumer")
            .with_dimensions([16])
            .with_split(SplitPolicy::Even)
            .with_input(InputSpec::new("in", ElementType::Real32)),
    )
    .unwrap();
    for i in 0..links {
        let name = format!("p{}", i);
        net.add_region(&RegionSpec::new(name.as_str()).with_output(
            OutputSpec::new("out", ElementType::Real32, ELEMENTS_PER_LINK).region_level(),
        ))
        .unwrap();
        net.link(UNIFORM_LINK, "", &format!("{}.out", name), "consumer.in")
            .unwrap();
    }
    net.initialize().unwrap();
    net
}

fn bench_prepare(c: &mut Criterion) {
    let mut group = c.benchmark_group("input_prepare");

    for links in [1, 2, 8, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(links), &links, |b, &links| {
            let mut net = build(links);
            b.iter(|| {
                net.prepare_inputs(black_box("consumer")).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_node_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("input_for_node");

    group.bench_function("even_split_16_nodes", |b| {
        let mut net = build(4);
        net.prepare_inputs("consumer").unwrap();
        let input = net.region("consumer").unwrap().input("in").unwrap();
        let mut node = Vec::<f32>::new();

        b.iter(|| {
            for index in 0..16 {
                input.get_input_for_node(black_box(index), &mut node).unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_prepare, bench_node_extraction);
criterion_main!(benches);
