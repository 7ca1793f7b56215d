use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{Duration, TimeZone, Utc};
use slo_core::{translate, BusinessDate, JobStatus, JobStatusDto, QueryPredicate};

fn dto(job_id: &str) -> JobStatusDto {
    JobStatusDto {
        application_id: "App1".to_string(),
        job_id: job_id.to_string(),
        job_status_code: "succeed".to_string(),
        job_status_timestamp: Utc.with_ymd_and_hms(2023, 6, 2, 0, 52, 32).unwrap(),
        business_date: BusinessDate::from_ymd(2023, 6, 1).unwrap(),
        run_id: "run-1".to_string(),
        host_id: "worker-01.example".to_string(),
    }
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    group.sample_size(1000);

    let now = Utc.with_ymd_and_hms(2023, 6, 20, 12, 0, 0).unwrap();

    group.bench_function("valid_job_status", |b| {
        b.iter(|| JobStatus::new_at(black_box(dto("Job1")), now).unwrap())
    });

    // Every rule fails: worst case for message formatting.
    group.bench_function("all_rules_violated", |b| {
        let bad = JobStatusDto {
            application_id: String::new(),
            job_id: "j".repeat(300),
            job_status_code: "nope".to_string(),
            job_status_timestamp: now + Duration::days(3),
            business_date: BusinessDate::from_ymd(2023, 6, 30).unwrap(),
            run_id: "r".repeat(60),
            host_id: "h".repeat(200),
        };
        b.iter(|| JobStatus::new_at(black_box(bad.clone()), now).unwrap_err())
    });

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    let params: Vec<(String, String)> = [
        ("applicationId", "App1"),
        ("jobId", "Job1"),
        ("jobStatusTimestamp", "2023-06-02T00:52:32.123+02:00"),
        ("businessDate", "2023-06-01"),
        ("unknown", "ignored"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    group.bench_function("translate_and_render", |b| {
        b.iter(|| translate(black_box(&params).iter().map(|(k, v)| (k, v))).unwrap().to_sql())
    });

    let now = Utc.with_ymd_and_hms(2023, 6, 20, 12, 0, 0).unwrap();
    for rows in [100usize, 1_000, 10_000] {
        let table: Vec<JobStatus> = (0..rows)
            .map(|i| JobStatus::new_at(dto(&format!("Job{}", i % 10)), now).unwrap())
            .collect();
        let predicate: QueryPredicate = translate([("jobId", "Job1")]).unwrap();

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("in_memory_scan", rows), &table, |b, table| {
            b.iter(|| table.iter().filter(|js| predicate.matches(js)).count())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validation, bench_query);
criterion_main!(benches);
