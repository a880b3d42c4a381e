use criterion::{criterion_group, criterion_main, Criterion};
use marionette_test_fixtures::cycle_set;
use marionette_timeline_core::{ColorTransform, Config, Engine, Inputs, PlayConfig};

fn bench_update(c: &mut Criterion) {
    let mut engine = Engine::new(Config::default());
    let set = engine.load_set(cycle_set().clone()).expect("valid fixture");
    engine.register_bone("root");
    engine.register_slot("body", ColorTransform::default(), 0, vec![]);
    engine.play(set, "walk", PlayConfig::default()).expect("clip exists");
    engine
        .play(
            set,
            "walk",
            PlayConfig {
                weight: 0.5,
                exclusive: false,
                ..Default::default()
            },
        )
        .expect("clip exists");

    c.bench_function("engine_update_60hz", |b| {
        b.iter(|| {
            engine.update(1.0 / 60.0, Inputs::default());
        })
    });
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
