use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use detector::{BoundingBox, Detection, DetectionBatch};
use fusion::{IouThreshold, fuse_with};

const LABELS: [&str; 5] = ["person", "car", "truck", "dog", "bicycle"];

/// Two models reporting on the same scene with jittered boxes
fn scene(objects: usize) -> Vec<DetectionBatch> {
    let mut rng = fastrand::Rng::with_seed(42);
    let truth: Vec<_> = (0..objects)
        .map(|i| {
            let x = rng.f32() * 600.0;
            let y = rng.f32() * 400.0;
            (i % LABELS.len(), x, y)
        })
        .collect();

    (0..2)
        .map(|_| {
            truth
                .iter()
                .map(|&(class_index, x, y)| {
                    let jitter = rng.f32() * 4.0;
                    Detection {
                        bbox: BoundingBox::new(x + jitter, y, x + 40.0 + jitter, y + 80.0),
                        class_index,
                        label: LABELS[class_index].to_string(),
                        confidence: 0.3 + rng.f32() * 0.7,
                    }
                })
                .collect()
        })
        .collect()
}

fn benchmark_fuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuse");
    let threshold = IouThreshold::new(0.5).unwrap();

    let object_counts = [
        (0, "empty"),
        (5, "few_objects"),
        (20, "typical_scene"),
        (100, "crowded_scene"),
    ];

    for (count, label) in object_counts {
        let batches = scene(count);

        group.bench_with_input(BenchmarkId::new("two_models", label), &batches, |b, batches| {
            b.iter(|| fuse_with(black_box(batches.clone()), threshold))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_fuse);
criterion_main!(benches);
