use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wallwars_core::{Board, Cell, Player, Variant, Wall, WallKind};

fn bench_legal_walls(c: &mut Criterion) {
    let mut board = Board::new(8, 8, Variant::Classic);
    board
        .place_wall(Player::Red, Wall::new(Cell::new(2, 2), WallKind::Right))
        .unwrap();
    board
        .place_wall(Player::Blue, Wall::new(Cell::new(4, 3), WallKind::Down))
        .unwrap();

    c.bench_function("legal_walls 8x8", |b| {
        b.iter(|| black_box(&board).legal_walls())
    });
}

fn bench_relative_distances(c: &mut Criterion) {
    let board = Board::new(8, 8, Variant::Classic);
    let blocked = board.blocked_directions();
    let mut queue = Vec::new();
    let mut dists = vec![1.0f32; 64];

    c.bench_function("fill_relative_distances 8x8", |b| {
        b.iter(|| {
            dists.fill(1.0);
            board.fill_relative_distances(
                black_box(Cell::new(0, 0)),
                &mut dists,
                &blocked,
                &mut queue,
            );
        })
    });
}

criterion_group!(benches, bench_legal_walls, bench_relative_distances);
criterion_main!(benches);
