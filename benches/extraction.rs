//! Benchmarks for sender identity recovery

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mailbox_ingest::extract_email_address;

fn identity_extraction_benchmark(c: &mut Criterion) {
    let long_headers = format!(
        "{}From: \"Doe, John\" <john.doe@mail.example.co.uk>\r\n",
        "Received: from relay.example.net by mx.example.org; Tue, 5 Mar 2024 14:07:00 +0000\r\n"
            .repeat(40)
    );
    let inputs: Vec<(&str, &str)> = vec![
        ("bare", "user@example.com"),
        ("display", "\"Jane Roe\" <jane.roe@corp.com>"),
        ("no_address", "Jane Roe (Accounts Payable)"),
        ("headers", &long_headers),
    ];

    let mut group = c.benchmark_group("identity_extraction");

    for (id, text) in &inputs {
        group.bench_with_input(BenchmarkId::new("extract", id), text, |b, text| {
            b.iter(|| extract_email_address(text));
        });
    }

    group.finish();
}

criterion_group!(benches, identity_extraction_benchmark);
criterion_main!(benches);
