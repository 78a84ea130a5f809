use super::*;
use crate::types::{Cell, Direction, Pawn, Player, Variant, Wall, WallKind, Winner};

fn wall(column: i32, row: i32, kind: WallKind) -> Wall {
    Wall::new(Cell::new(column, row), kind)
}

#[test]
fn new_board_places_pawns_in_corners() {
    let board = Board::new(5, 5, Variant::Classic);

    assert_eq!(board.position(Player::Red), Cell::new(0, 0));
    assert_eq!(board.position(Player::Blue), Cell::new(4, 0));
    assert_eq!(board.mouse(Player::Red), Cell::new(0, 4));
    assert_eq!(board.mouse(Player::Blue), Cell::new(4, 4));

    // Each player's goal is the opposing mouse.
    assert_eq!(board.goal(Player::Red), Cell::new(4, 4));
    assert_eq!(board.goal(Player::Blue), Cell::new(0, 4));
}

#[test]
fn boundaries_are_permanently_blocked() {
    let board = Board::new(4, 4, Variant::Classic);

    assert!(board.is_blocked(wall(3, 0, WallKind::Right)));
    assert!(board.is_blocked(wall(0, 3, WallKind::Down)));
    assert!(board.is_blocked(wall(-1, 0, WallKind::Right)));
    assert!(board.is_blocked(wall(0, 4, WallKind::Down)));
    assert!(!board.is_blocked(wall(1, 1, WallKind::Right)));
}

#[test]
fn placed_wall_blocks_and_reports_owner() {
    let mut board = Board::new(5, 5, Variant::Classic);
    let w = wall(2, 2, WallKind::Right);

    assert_eq!(board.wall_owner(w), None);
    board.place_wall(Player::Blue, w).unwrap();

    assert!(board.is_blocked(w));
    assert_eq!(board.wall_owner(w), Some(Player::Blue));
    // Boundary edges are blocked but ownerless.
    assert_eq!(board.wall_owner(wall(4, 0, WallKind::Right)), None);

    // Double placement is an error, regardless of owner.
    assert!(matches!(
        board.place_wall(Player::Red, w),
        Err(BoardError::WallOccupied { .. })
    ));
}

#[test]
fn wall_bits_are_consistent_with_is_blocked() {
    let mut board = Board::new(5, 5, Variant::Standard);
    board.place_wall(Player::Red, wall(1, 1, WallKind::Down)).unwrap();
    board.place_wall(Player::Blue, wall(3, 2, WallKind::Right)).unwrap();

    for column in 0..5 {
        for row in 0..5 {
            for kind in [WallKind::Right, WallKind::Down] {
                let w = wall(column, row, kind);
                assert_eq!(board.wall_owner(w).is_some(), board.is_blocked(w) && {
                    let boundary = match kind {
                        WallKind::Right => column == 4,
                        WallKind::Down => row == 4,
                    };
                    !boundary
                });
            }
        }
    }
}

#[test]
fn legal_directions_respect_walls() {
    let mut board = Board::new(5, 5, Variant::Classic);

    // Top-left corner: only Right and Down.
    let dirs = board.legal_directions(Player::Red, Pawn::Cat);
    assert_eq!(dirs, vec![Direction::Right, Direction::Down]);

    board.place_wall(Player::Blue, wall(0, 0, WallKind::Right)).unwrap();
    let dirs = board.legal_directions(Player::Red, Pawn::Cat);
    assert_eq!(dirs, vec![Direction::Down]);
}

#[test]
fn mouse_never_moves_in_classic() {
    let board = Board::new(5, 5, Variant::Classic);
    assert!(board.legal_directions(Player::Red, Pawn::Mouse).is_empty());
    assert!(board.legal_directions(Player::Blue, Pawn::Mouse).is_empty());

    let mut board = board;
    assert!(matches!(
        board.do_action(
            Player::Red,
            Action::Pawn(PawnMove {
                pawn: Pawn::Mouse,
                direction: Direction::Right,
            }),
        ),
        Err(BoardError::MouseImmobile)
    ));
}

#[test]
fn mouse_moves_in_standard() {
    let board = Board::new(5, 5, Variant::Standard);
    let dirs = board.legal_directions(Player::Red, Pawn::Mouse);
    // Bottom-left corner: Right and Up.
    assert_eq!(dirs, vec![Direction::Right, Direction::Up]);
}

#[test]
fn take_step_through_wall_is_an_error() {
    let mut board = Board::new(5, 5, Variant::Classic);
    board.place_wall(Player::Blue, wall(0, 0, WallKind::Right)).unwrap();

    assert!(matches!(
        board.take_step(Player::Red, Pawn::Cat, Direction::Right),
        Err(BoardError::BlockedStep { .. })
    ));
    // The failed step must not have moved anything.
    assert_eq!(board.position(Player::Red), Cell::new(0, 0));
}

#[test]
fn take_step_updates_cell_bits_and_position() {
    let mut board = Board::new(5, 5, Variant::Classic);
    board.take_step(Player::Red, Pawn::Cat, Direction::Right).unwrap();
    board.take_step(Player::Red, Pawn::Cat, Direction::Down).unwrap();

    assert_eq!(board.position(Player::Red), Cell::new(1, 1));

    // Moving back and forth keeps the board consistent with a fresh clone.
    let snapshot = board.clone();
    board.take_step(Player::Red, Pawn::Cat, Direction::Left).unwrap();
    board.take_step(Player::Red, Pawn::Cat, Direction::Right).unwrap();
    assert_eq!(board, snapshot);
}

#[test]
fn distance_and_unreachable() {
    let mut board = Board::new(4, 4, Variant::Classic);
    assert_eq!(board.distance(Cell::new(0, 0), Cell::new(3, 3)), Some(6));
    assert_eq!(board.distance(Cell::new(2, 2), Cell::new(2, 2)), Some(0));

    // Wall off the top-left cell entirely.
    board.place_wall(Player::Red, wall(0, 0, WallKind::Right)).unwrap();
    board.place_wall(Player::Red, wall(0, 0, WallKind::Down)).unwrap();
    assert_eq!(board.distance(Cell::new(0, 0), Cell::new(3, 3)), None);
}

#[test]
fn relative_distances_are_normalized() {
    let board = Board::new(4, 4, Variant::Classic);
    let dists = board.relative_distances(Cell::new(0, 0));

    assert_eq!(dists[board.index_from_cell(Cell::new(0, 0))], 0.0);
    let far = dists[board.index_from_cell(Cell::new(3, 3))];
    assert!((far - 6.0 / 16.0).abs() < 1e-6);
    assert!(dists.iter().all(|&d| (0.0..=1.0).contains(&d)));
}

#[test]
fn relative_distances_keep_unreachable_at_one() {
    let mut board = Board::new(4, 4, Variant::Classic);
    board.place_wall(Player::Red, wall(0, 3, WallKind::Right)).unwrap();
    board.place_wall(Player::Red, wall(0, 2, WallKind::Down)).unwrap();

    let dists = board.relative_distances(Cell::new(0, 0));
    assert_eq!(dists[board.index_from_cell(Cell::new(0, 3))], 1.0);
}

#[test]
fn legal_walls_exclude_bridges() {
    // 4x4 classic board with a corridor: block (0,*) from (1,*) except at
    // row 3, so the wall at (0,2)-(0,3) becomes the only way to keep the
    // left column connected.
    let mut board = Board::with_positions(
        4,
        4,
        Cell::new(0, 0),
        Cell::new(3, 3),
        Cell::new(3, 0),
        Cell::new(0, 3),
        Variant::Classic,
    );
    // Red cat at (0,0) must reach its goal (blue mouse) at (0,3).
    board.place_wall(Player::Blue, wall(0, 0, WallKind::Right)).unwrap();
    board.place_wall(Player::Blue, wall(0, 1, WallKind::Right)).unwrap();
    board.place_wall(Player::Blue, wall(0, 2, WallKind::Right)).unwrap();

    // The left column is now a dead-end corridor: every Down edge in it is a
    // bridge on red's path.
    let legal = board.legal_walls();
    assert!(!legal.contains(&wall(0, 0, WallKind::Down)));
    assert!(!legal.contains(&wall(0, 1, WallKind::Down)));
    assert!(!legal.contains(&wall(0, 2, WallKind::Down)));

    // A wall far from the corridor stays legal.
    assert!(legal.contains(&wall(2, 1, WallKind::Right)));
}

#[test]
fn legal_walls_never_disconnect() {
    // Property check on a small board: applying any legal wall leaves both
    // cats connected to their goals.
    let mut board = Board::new(4, 4, Variant::Classic);
    board.place_wall(Player::Red, wall(1, 0, WallKind::Down)).unwrap();
    board.place_wall(Player::Blue, wall(2, 2, WallKind::Right)).unwrap();

    for w in board.legal_walls() {
        let mut next = board.clone();
        next.place_wall(Player::Red, w).unwrap();
        for player in [Player::Red, Player::Blue] {
            assert!(
                next.distance(next.position(player), next.goal(player)).is_some(),
                "wall {w} disconnects {player}"
            );
        }
    }
}

#[test]
fn winner_requires_capture() {
    let board = Board::new(5, 5, Variant::Classic);
    assert_eq!(board.winner(), Winner::Undecided);
}

#[test]
fn red_capture_wins_when_race_is_not_close() {
    // Red cat on blue mouse; blue cat far from red mouse.
    let board = Board::with_positions(
        5,
        5,
        Cell::new(4, 4), // red cat == blue mouse
        Cell::new(0, 4),
        Cell::new(4, 0), // blue cat, distance 4 from red mouse
        Cell::new(4, 4),
        Variant::Classic,
    );
    assert_eq!(board.winner(), Winner::Red);
    assert_eq!(board.score_for(Player::Red), 1.0);
    assert_eq!(board.score_for(Player::Blue), -1.0);
}

#[test]
fn red_capture_draws_when_blue_is_close() {
    // Blue cat two steps from red's mouse at the moment red captures.
    let board = Board::with_positions(
        5,
        5,
        Cell::new(4, 4),
        Cell::new(0, 4),
        Cell::new(1, 3), // distance 2 from (0, 4)
        Cell::new(4, 4),
        Variant::Classic,
    );
    assert_eq!(board.winner(), Winner::Draw);
    assert_eq!(board.score_for(Player::Red), 0.0);
}

#[test]
fn unreachable_mouse_does_not_draw() {
    // Blue's cat is sealed off from red's mouse, so the close-race rule
    // cannot apply even though the BFS has no distance to compare.
    let mut board = Board::with_positions(
        5,
        5,
        Cell::new(4, 4),
        Cell::new(0, 4),
        Cell::new(0, 0),
        Cell::new(4, 4),
        Variant::Classic,
    );
    board.place_wall(Player::Red, wall(0, 0, WallKind::Right)).unwrap();
    board.place_wall(Player::Red, wall(0, 0, WallKind::Down)).unwrap();

    assert_eq!(board.distance(board.position(Player::Blue), board.mouse(Player::Red)), None);
    assert_eq!(board.winner(), Winner::Red);
}

#[test]
fn blue_capture_wins_immediately() {
    let board = Board::with_positions(
        5,
        5,
        Cell::new(0, 0),
        Cell::new(0, 4),
        Cell::new(0, 4), // blue cat == red mouse
        Cell::new(4, 4),
        Variant::Classic,
    );
    assert_eq!(board.winner(), Winner::Blue);
}

#[test]
fn score_tracks_distance_advantage() {
    let board = Board::new(5, 5, Variant::Classic);
    // Symmetric start: both scores are 0.
    assert_eq!(board.score_for(Player::Red), 0.0);

    let mut board = board;
    board.take_step(Player::Red, Pawn::Cat, Direction::Right).unwrap();
    board.take_step(Player::Red, Pawn::Cat, Direction::Down).unwrap();

    let red = board.score_for(Player::Red);
    let blue = board.score_for(Player::Blue);
    assert!(red > 0.0 && red < 1.0);
    assert!(blue < 0.0 && blue > -1.0);
}

#[test]
fn legal_actions_cover_moves_and_walls() {
    let board = Board::new(4, 4, Variant::Standard);
    let actions = board.legal_actions(Player::Red);

    let pawn_moves = actions
        .iter()
        .filter(|a| matches!(a, Action::Pawn(_)))
        .count();
    let walls = actions
        .iter()
        .filter(|a| matches!(a, Action::Wall(_)))
        .count();

    // Corner cat has 2 directions, corner mouse has 2 directions.
    assert_eq!(pawn_moves, 4);
    // Empty 4x4 board: 2 * 4 * 4 edges minus 4 + 4 boundary edges.
    assert_eq!(walls, 24);
    assert_eq!(walls, board.legal_walls().len());
}

#[test]
fn cell_index_round_trip() {
    let board = Board::new(6, 4, Variant::Classic);
    for index in 0..(6 * 4) {
        assert_eq!(board.index_from_cell(board.cell_at_index(index)), index);
    }
}

#[test]
fn flip_horizontal_round_trip() {
    let board = Board::new(5, 5, Variant::Classic);
    let cell = Cell::new(1, 3);
    assert_eq!(board.flip_horizontal(cell), Cell::new(3, 3));
    assert_eq!(board.flip_horizontal(board.flip_horizontal(cell)), cell);

    let w = wall(1, 2, WallKind::Right);
    assert_eq!(board.flip_horizontal_wall(board.flip_horizontal_wall(w)), w);
}
