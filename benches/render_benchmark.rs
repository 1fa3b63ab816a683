use criterion::{Criterion, black_box, criterion_group, criterion_main};
use travel_feed_tui::utils::text::{truncate, wrap_content};

fn benchmark_wrap_content(c: &mut Criterion) {
    let body = "We left Hanoi before dawn and rode north along the river, stopping for pho in a roadside stall where the owner insisted we try her homemade chili. By noon the karst peaks had started to rise around us.";

    c.bench_function("wrap_content short", |b| {
        b.iter(|| wrap_content(black_box(body), black_box(80)))
    });

    let long_body = [body; 40].join("\n\n");
    c.bench_function("wrap_content long", |b| {
        b.iter(|| wrap_content(black_box(&long_body), black_box(80)))
    });

    c.bench_function("truncate title", |b| {
        b.iter(|| truncate(black_box(body), black_box(60)))
    });
}

criterion_group!(benches, benchmark_wrap_content);
criterion_main!(benches);
