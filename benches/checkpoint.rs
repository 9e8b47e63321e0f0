use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rbc_download::{Checkpoint, CheckpointStore, Dimension, WorkGrid};

fn era5_sized_grid() -> WorkGrid {
    WorkGrid::new(vec![
        Dimension::new("year", 1990..2025),
        Dimension::new("month", rbc_download::all_months()),
        Dimension::new("level_type", ["single", "pressure", "model"]),
    ])
    .unwrap()
}

fn bench_checkpoint(c: &mut Criterion) {
    let grid = era5_sized_grid();
    let mut checkpoint = Checkpoint::fresh(&grid);
    for unit in grid.units().step_by(2) {
        checkpoint.mark(unit.coord(), true).unwrap();
    }
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::in_dir(dir.path());

    c.bench_function("grid_units", |b| {
        b.iter(|| black_box(&grid).units().filter(|u| !checkpoint.is_done(u.coord())).count())
    });
    c.bench_function("checkpoint_save", |b| {
        b.iter(|| store.save(black_box(&checkpoint)).unwrap())
    });
    c.bench_function("checkpoint_load", |b| {
        b.iter(|| store.load(black_box(&grid), true).unwrap())
    });
}

criterion_group!(benches, bench_checkpoint);
criterion_main!(benches);
