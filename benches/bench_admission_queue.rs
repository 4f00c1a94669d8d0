use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use traffic_sim::control_system::admission::AdmissionQueue;
use traffic_sim::simulation_engine::vehicles::VehicleId;

fn bench_admission_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission_queue");
    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));

    for &size in [10u64, 100, 1000].iter() {
        group.bench_function(format!("enqueue_release_{}", size), |b| {
            b.iter(|| {
                let mut queue = AdmissionQueue::new();
                for i in 0..size {
                    black_box(queue.enqueue(VehicleId(i)));
                }
                for _ in 0..size {
                    black_box(queue.release_head());
                }
            });
        });
    }

    group.bench_function("withdraw_mid_queue", |b| {
        b.iter(|| {
            let mut queue = AdmissionQueue::new();
            for i in 0..100u64 {
                queue.enqueue(VehicleId(i));
            }
            for i in (0..100u64).rev() {
                black_box(queue.remove(VehicleId(i)));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_admission_queue);
criterion_main!(benches);
