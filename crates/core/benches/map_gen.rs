use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessera::{Atlas, MapConfig, TileMap};

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("map-generation");
    group.sample_size(10);

    let atlas = Atlas::default();
    let config = MapConfig::default();
    group.bench_function("map gen", |b| {
        b.iter(|| TileMap::generate(black_box(config.clone()), &atlas))
    });

    // Same map, but every pair needs repair and every path wiggles hard
    let config = MapConfig {
        separations: vec![],
        paths: MapConfig::default()
            .paths
            .into_iter()
            .map(|path| tessera::PathConfig { wiggle: 2.0, ..path })
            .collect(),
        ..Default::default()
    };
    let sparse_atlas = Atlas::from_sheet_names(&[
        "transition_grass_water.png",
        "transition_grass_desert.png",
        "overlay_road.png",
        "overlay_river.png",
    ])
    .unwrap();
    group.bench_function("map gen with repair", |b| {
        b.iter(|| TileMap::generate(black_box(config.clone()), &sparse_atlas))
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
