use atlas_core::{
    build_lattice_graph, markup_grid, markup_pack, resample, AffineProjection, Bounds, Burg,
    EntityList, Grid, Map, Overlays, Pack, Point, ResampleOptions,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn island_map(side: usize) -> Map {
    let extent = side as f64 * 10.0;
    let bounds = Bounds::new(extent, extent);
    let mut grid = Grid::generate(bounds, side * side, 0.9, 11);
    let center = Point::new(extent / 2.0, extent / 2.0);
    grid.cells.h = grid
        .points
        .iter()
        .map(|p| {
            let falloff = p.distance(center) / (extent / 2.0);
            (60.0 * (1.0 - falloff)).clamp(0.0, 60.0) as u8
        })
        .collect();
    markup_grid(&mut grid, 500);
    let mut pack = Pack::new(build_lattice_graph(&grid));
    markup_pack(&mut pack, 500);

    let states: Vec<u16> = pack
        .cells
        .p
        .iter()
        .enumerate()
        .map(|(cell, p)| {
            if !pack.cells.is_land(cell) {
                0
            } else {
                1 + (p.x > center.x) as u16 + 2 * (p.y > center.y) as u16
            }
        })
        .collect();
    pack.cells.state = states.clone();
    pack.cells.culture = states;

    let burgs: EntityList<Burg> = std::iter::once(Burg::default())
        .chain(
            (0..pack.cells.len())
                .filter(|&cell| pack.cells.is_land(cell))
                .step_by(7)
                .enumerate()
                .map(|(n, cell)| Burg {
                    i: n as u16 + 1,
                    cell: cell as u32,
                    x: pack.cells.p[cell].x,
                    y: pack.cells.p[cell].y,
                    population: 2.0,
                    ..Default::default()
                }),
        )
        .collect();

    Map {
        bounds,
        seed: 11,
        grid,
        pack,
        overlays: Overlays {
            burgs,
            ..Default::default()
        },
    }
}

fn bench_resample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resample");

    for side in [32usize, 64, 128] {
        let parent = island_map(side);
        let extent = side as f64 * 10.0;
        group.bench_with_input(BenchmarkId::new("identity", side), &parent, |b, parent| {
            let options = ResampleOptions::default();
            b.iter(|| resample(parent, &options).expect("resample"));
        });
        group.bench_with_input(BenchmarkId::new("zoom_2x", side), &parent, |b, parent| {
            let bounds = Bounds::new(extent, extent);
            let window = Bounds::new(extent / 2.0, extent / 2.0);
            let options = ResampleOptions::default()
                .with_projection(AffineProjection::window(
                    Point::new(extent / 4.0, extent / 4.0),
                    window,
                    bounds,
                ))
                .with_scale(0.25);
            b.iter(|| resample(parent, &options).expect("resample"));
        });
    }

    group.finish();
}

criterion_group!(resample_benches, bench_resample);
criterion_main!(resample_benches);
