//! Event bus publish benchmarks.
//!
//! Measures the non-blocking publish path with no, one and several
//! subscribers. Subscriber queues are drained between batches so the
//! measured path is the enqueue, not the drop branch.

use criterion::{Criterion, criterion_group, criterion_main};
use modus_core::{EventBus, Subscription};
use std::hint::black_box;

fn drain_all(subs: &mut [Subscription]) {
    for sub in subs {
        sub.drain();
    }
}

fn bench_publish_no_subscribers(c: &mut Criterion) {
    let bus = EventBus::new();
    c.bench_function("publish_no_subscribers", |b| {
        b.iter(|| bus.publish(black_box("sensor/temp"), black_box(21), None, "bench"));
    });
}

fn bench_publish_fanout(c: &mut Criterion) {
    for fanout in [1usize, 4, 16] {
        let bus = EventBus::with_capacity(1024);
        let mut subs: Vec<Subscription> = (0..fanout).map(|_| bus.subscribe("sensor/temp")).collect();
        let mut sent = 0usize;

        c.bench_function(&format!("publish_fanout_{fanout}"), |b| {
            b.iter(|| {
                bus.publish(black_box("sensor/temp"), black_box(21), None, "bench");
                sent += 1;
                if sent % 1000 == 0 {
                    drain_all(&mut subs);
                }
            });
        });
    }
}

fn bench_publish_full_queue(c: &mut Criterion) {
    let bus = EventBus::with_capacity(1);
    let _sub = bus.subscribe("sensor/temp");
    bus.publish("sensor/temp", 0, None, "bench");

    c.bench_function("publish_full_queue_drop", |b| {
        b.iter(|| black_box(bus.publish("sensor/temp", 1, None, "bench")));
    });
}

criterion_group!(
    benches,
    bench_publish_no_subscribers,
    bench_publish_fanout,
    bench_publish_full_queue
);
criterion_main!(benches);
