//! # Reachability Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use gantry_lib::{
    gantry_ctrl::{kinematics, Params},
    map::{HeightMap, ReachMap},
};

fn reach_map_benchmark(c: &mut Criterion) {
    // ---- Build a large gantry ----

    let params: Params = util::params::from_str(
        "area_width = 65\n\
        area_height = 65\n\
        max_horizontal_extension_m = 60.0",
    )
    .unwrap();

    c.bench_function("ReachMap::build", |b| b.iter(|| ReachMap::build(&params)));

    // Readings of every actuator at the centre of the area
    let centre = (params.area_width / 2) as f64;
    let exts = kinematics::horizontal_extensions(&params, centre, centre);
    let readings = [
        vec![exts[0]; params.num_horizontal_actuators],
        vec![exts[1]; params.num_horizontal_actuators],
        vec![exts[2]; params.num_horizontal_actuators],
        vec![exts[3]; params.num_horizontal_actuators],
    ];

    c.bench_function("kinematics::closest_reachable", |b| {
        b.iter(|| kinematics::closest_reachable(&params, &readings))
    });

    let reach_map = ReachMap::build(&params);
    let mut height_map = HeightMap::new(params.area_width, params.area_height);
    height_map.reset(&reach_map);

    c.bench_function("HeightMap::closest_unscanned", |b| {
        b.iter(|| height_map.closest_unscanned(&reach_map, (centre, centre)))
    });
}

criterion_group!(benches, reach_map_benchmark);
criterion_main!(benches);
