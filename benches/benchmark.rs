use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use screenshot_batch::{
    capture_detail, expand_tasks, format_elapsed, format_file_size, naming, parse_sizes,
    plan_batches, RunConfig, ViewportSize,
};
use std::time::Duration;

// Fast settings for all benchmarks
fn configure_fast_group(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_millis(500));
    group.sample_size(20);
}

fn benchmark_config_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("config");
    configure_fast_group(&mut group);

    group.bench_function("creation", |b| {
        b.iter(|| {
            let config = RunConfig::default();
            black_box(config);
        });
    });

    group.bench_function("from_json", |b| {
        let json = r#"{"concurrency": 4, "readiness": {"scroll_step": 200}}"#;
        b.iter(|| {
            let config: RunConfig = serde_json::from_str(black_box(json)).unwrap();
            black_box(config);
        });
    });

    group.finish();
}

fn benchmark_size_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("size_parsing");
    configure_fast_group(&mut group);

    let inputs = ["1440x1080", "390x844", "1920X1080", "x100", "99999999999999999999x1"];

    group.bench_function("mixed_inputs", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = black_box(ViewportSize::parse(black_box(input)));
            }
        });
    });

    group.bench_function("parse_sizes", |b| {
        b.iter(|| {
            let sizes = parse_sizes(black_box(&["1440x1080", "1280x720", "390x844"])).unwrap();
            black_box(sizes);
        });
    });

    group.finish();
}

fn benchmark_task_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("task_expansion");
    configure_fast_group(&mut group);

    let urls: Vec<String> = (0..50).map(|i| format!("site{i}.example.com/page")).collect();
    let sizes = parse_sizes(&["1440x1080", "1280x720", "390x844"]).unwrap();

    group.bench_function("50_urls_3_sizes", |b| {
        b.iter(|| {
            let tasks = expand_tasks(black_box(&urls), black_box(&sizes)).unwrap();
            black_box(tasks);
        });
    });

    group.bench_function("plan_batches", |b| {
        b.iter(|| {
            let batches = plan_batches(black_box(150), black_box(8));
            black_box(batches);
        });
    });

    group.finish();
}

fn benchmark_filename_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("filename_synthesis");
    configure_fast_group(&mut group);

    let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let sizes = parse_sizes(&["1440x1080", "390x844"]).unwrap();
    let tasks = expand_tasks(
        &[
            "example.com",
            "https://docs.example.com/guide/getting-started/",
            "http://localhost:8080/a/b/c?x=1",
        ],
        &sizes,
    )
    .unwrap();

    group.bench_function("file_name", |b| {
        b.iter(|| {
            for task in &tasks {
                black_box(naming::file_name(black_box(task), tasks.len(), timestamp));
            }
        });
    });

    group.finish();
}

fn benchmark_format_utilities(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_utilities");
    configure_fast_group(&mut group);

    group.bench_function("format_elapsed", |b| {
        b.iter(|| {
            black_box(format_elapsed(black_box(Duration::from_millis(4_320))));
        });
    });

    group.bench_function("format_file_size", |b| {
        b.iter(|| {
            black_box(format_file_size(black_box(1_572_864)));
        });
    });

    group.bench_function("capture_detail", |b| {
        b.iter(|| {
            black_box(capture_detail(
                black_box(Some(1_572_864)),
                black_box(Duration::from_secs(3)),
            ));
        });
    });

    group.finish();
}

criterion_group!(
    unit_benches,
    benchmark_config_creation,
    benchmark_size_parsing,
    benchmark_task_expansion,
    benchmark_filename_synthesis,
    benchmark_format_utilities,
);

criterion_main!(unit_benches);
