//! Benchmarks for incident routing and run planning.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use reportflow::core::{Severity, StageNumber};
use reportflow::events::NoOpIncidentSink;
use reportflow::incidents::{codes, IncidentReport};
use reportflow::pipeline::RunPlan;
use reportflow::testing::TestPipeline;
use std::collections::BTreeSet;
use std::sync::Arc;

fn register_benchmark(c: &mut Criterion) {
    let dir = std::env::temp_dir().join("reportflow-bench");
    let pipeline = TestPipeline::standard(&dir)
        .with_incident_level(Severity::Debug)
        .with_log_level(Severity::Fatal);

    c.bench_function("register_catalog_code", |b| {
        b.iter_batched_ref(
            || pipeline.clone().context_with_sink(Arc::new(NoOpIncidentSink)),
            |ctx| black_box(ctx.register(IncidentReport::code(codes::MANIFEST_PARSE_FAILED))),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("register_below_threshold", |b| {
        let mut quiet = pipeline
            .clone()
            .with_incident_level(Severity::Error)
            .context_with_sink(Arc::new(NoOpIncidentSink));
        b.iter(|| black_box(quiet.register(IncidentReport::adhoc(Severity::Info, "row ok"))));
    });
}

fn plan_benchmark(c: &mut Criterion) {
    let domain: Vec<StageNumber> = (1..=200).map(|n| StageNumber(n * 10)).collect();
    let skip: BTreeSet<StageNumber> = (1..=20).map(|n| StageNumber(n * 70)).collect();

    c.bench_function("realize_plan_200", |b| {
        b.iter(|| {
            let plan = RunPlan::realize(
                black_box(&domain),
                Some(StageNumber(100)),
                Some(StageNumber(1900)),
                black_box(&skip),
            );
            black_box(plan.run_list())
        });
    });
}

criterion_group!(benches, register_benchmark, plan_benchmark);
criterion_main!(benches);
