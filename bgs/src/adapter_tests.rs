use super::*;
use serde_json::json;

fn standard_config(width: i32, height: i32) -> BgsConfig {
    serde_json::from_value(json!({
        "variant": "standard",
        "boardWidth": width,
        "boardHeight": height,
        "initialState": {
            "pawns": {
                "p1": {"cat": [height - 1, 0], "mouse": [height - 1, width - 1]},
                "p2": {"cat": [0, width - 1], "mouse": [0, 0]},
            },
            "walls": [],
        },
    }))
    .unwrap()
}

fn classic_config(width: i32, height: i32) -> BgsConfig {
    serde_json::from_value(json!({
        "variant": "classic",
        "boardWidth": width,
        "boardHeight": height,
        "initialState": {
            "pawns": {
                "p1": {"cat": [height - 1, 0], "home": [height - 1, width - 1]},
                "p2": {"cat": [0, width - 1], "home": [0, 0]},
            },
            "walls": [],
        },
    }))
    .unwrap()
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn valid_standard_config() {
    assert_eq!(
        validate_bgs_config(&standard_config(6, 6), 8, 8).unwrap(),
        Variant::Standard
    );
}

#[test]
fn valid_classic_config() {
    assert_eq!(
        validate_bgs_config(&classic_config(5, 5), 8, 8).unwrap(),
        Variant::Classic
    );
}

#[test]
fn board_too_large_is_rejected() {
    let error = validate_bgs_config(&standard_config(10, 10), 8, 8).unwrap_err();
    assert!(error.to_string().contains("exceed"));
}

#[test]
fn board_too_small_is_rejected() {
    let error = validate_bgs_config(&standard_config(3, 3), 8, 8).unwrap_err();
    assert!(error.to_string().contains("4x4"));
}

#[test]
fn unsupported_variant_is_rejected() {
    let mut config = standard_config(6, 6);
    config.variant = "survival".into();
    let error = validate_bgs_config(&config, 8, 8).unwrap_err();
    assert!(error.to_string().contains("survival"));
}

#[test]
fn standard_without_mice_is_rejected() {
    let mut config = standard_config(6, 6);
    config.initial_state.pawns.p1.mouse = None;
    let error = validate_bgs_config(&config, 8, 8).unwrap_err();
    assert!(error.to_string().contains("mouse"));
}

// ============================================================================
// Board construction
// ============================================================================

#[test]
fn convert_standard_config() {
    let (board, turn, padding) = convert_bgs_config_to_board(&standard_config(6, 6), 8, 8).unwrap();

    assert_eq!(turn, Turn::new(Player::Red, TurnAction::First));
    assert_eq!(board.rows(), 8);
    assert_eq!(board.columns(), 8);
    assert_eq!(board.variant(), Variant::Standard);
    assert_eq!(padding.game_rows, 6);
    assert_eq!(padding.game_columns, 6);
    assert_eq!(padding.row_offset, 0);

    // Pawns land where the wire said, in model coordinates.
    assert_eq!(board.position(Player::Red), Cell::new(0, 5));
    assert_eq!(board.mouse(Player::Red), Cell::new(5, 5));
    assert_eq!(board.position(Player::Blue), Cell::new(5, 0));
    assert_eq!(board.mouse(Player::Blue), Cell::new(0, 0));
}

#[test]
fn convert_classic_config_uses_corner_goals() {
    let (board, _, padding) = convert_bgs_config_to_board(&classic_config(5, 5), 8, 8).unwrap();

    assert_eq!(board.variant(), Variant::Classic);
    assert_eq!(padding.row_offset, 3);
    assert_eq!(padding.col_offset, 1);

    // The configured homes are ignored; the goals sit in the model corners.
    assert_eq!(board.mouse(Player::Red), Cell::new(0, 7));
    assert_eq!(board.mouse(Player::Blue), Cell::new(7, 7));
    assert_eq!(board.goal(Player::Red), Cell::new(7, 7));

    // Both cats can actually reach their goals through the padding layout.
    for player in [Player::Red, Player::Blue] {
        assert!(board
            .distance(board.position(player), board.goal(player))
            .is_some());
    }
}

#[test]
fn convert_full_size_needs_no_padding() {
    let (_, _, padding) = convert_bgs_config_to_board(&standard_config(8, 8), 8, 8).unwrap();
    assert!(!padding.needs_padding());
}

#[test]
fn convert_places_initial_walls() {
    let mut config = standard_config(6, 6);
    config.initial_state.walls = vec![
        WallSpec {
            cell: [2, 2],
            orientation: "vertical".into(),
            player_id: 1,
        },
        WallSpec {
            cell: [3, 3],
            orientation: "horizontal".into(),
            player_id: 2,
        },
    ];

    let (board, _, _) = convert_bgs_config_to_board(&config, 8, 8).unwrap();

    // Vertical wall at game (row 2, col 2): Right wall at model (2, 2).
    assert_eq!(
        board.wall_owner(Wall::new(Cell::new(2, 2), WallKind::Right)),
        Some(Player::Red)
    );
    // Horizontal wall above game (row 3, col 3): Down wall at model (3, 2).
    assert_eq!(
        board.wall_owner(Wall::new(Cell::new(3, 2), WallKind::Down)),
        Some(Player::Blue)
    );
}

#[test]
fn convert_rejects_bad_orientation() {
    let mut config = standard_config(6, 6);
    config.initial_state.walls = vec![WallSpec {
        cell: [2, 2],
        orientation: "diagonal".into(),
        player_id: 1,
    }];
    assert!(convert_bgs_config_to_board(&config, 8, 8).is_err());
}

// ============================================================================
// Move parsing
// ============================================================================

#[test]
fn parse_cat_and_mouse_move() {
    let (board, turn, padding) = convert_bgs_config_to_board(&standard_config(8, 8), 8, 8).unwrap();

    // Red cat a1 -> a2, red mouse h1 -> h2 (one step up each).
    let mv = parse_move_notation("Ca2.Mh2", &board, turn, &padding).unwrap();
    assert_eq!(
        mv.first,
        Action::Pawn(PawnMove {
            pawn: Pawn::Cat,
            direction: Direction::Up,
        })
    );
    assert_eq!(
        mv.second,
        Action::Pawn(PawnMove {
            pawn: Pawn::Mouse,
            direction: Direction::Up,
        })
    );
}

#[test]
fn parse_double_cat_step() {
    let (board, turn, padding) = convert_bgs_config_to_board(&standard_config(8, 8), 8, 8).unwrap();

    // Cumulative destination two steps from a1.
    let mv = parse_move_notation("Ca3", &board, turn, &padding).unwrap();
    assert!(matches!(mv.first, Action::Pawn(PawnMove { pawn: Pawn::Cat, .. })));
    assert!(matches!(mv.second, Action::Pawn(PawnMove { pawn: Pawn::Cat, .. })));

    // Replaying the two actions lands on a3 = model (0, 5).
    let mut replay = board.clone();
    replay.do_action(turn.player, mv.first).unwrap();
    replay.do_action(turn.player, mv.second).unwrap();
    assert_eq!(replay.position(Player::Red), Cell::new(0, 5));
}

#[test]
fn parse_pawn_move_and_wall() {
    let (board, turn, padding) = convert_bgs_config_to_board(&standard_config(8, 8), 8, 8).unwrap();

    let mv = parse_move_notation("Ca2.>b3", &board, turn, &padding).unwrap();
    assert!(matches!(mv.first, Action::Pawn(_)));
    assert_eq!(
        mv.second,
        Action::Wall(Wall::new(Cell::new(1, 5), WallKind::Right))
    );
}

#[test]
fn parse_two_walls() {
    let (board, turn, padding) = convert_bgs_config_to_board(&standard_config(8, 8), 8, 8).unwrap();

    let mv = parse_move_notation(">b3.^c4", &board, turn, &padding).unwrap();
    assert_eq!(
        mv.first,
        Action::Wall(Wall::new(Cell::new(1, 5), WallKind::Right))
    );
    // ^c4: the wall above game cell c4 = internal (2, 4), so Down at (2, 3).
    assert_eq!(
        mv.second,
        Action::Wall(Wall::new(Cell::new(2, 3), WallKind::Down))
    );
}

#[test]
fn parse_orders_pawn_steps_before_walls() {
    let (board, turn, padding) = convert_bgs_config_to_board(&standard_config(8, 8), 8, 8).unwrap();

    // Wall listed first in notation still applies after the pawn step.
    let mv = parse_move_notation(">b3.Ca2", &board, turn, &padding).unwrap();
    assert!(matches!(mv.first, Action::Pawn(_)));
    assert!(matches!(mv.second, Action::Wall(_)));
}

#[test]
fn parse_translates_padded_coordinates() {
    let (board, turn, padding) = convert_bgs_config_to_board(&classic_config(5, 5), 8, 8).unwrap();

    // Red cat starts at game a1 = model (1, 7). Game b1 = model (2, 7),
    // one step right.
    let mv = parse_move_notation("Cb1.>c3", &board, turn, &padding).unwrap();
    assert_eq!(
        mv.first,
        Action::Pawn(PawnMove {
            pawn: Pawn::Cat,
            direction: Direction::Right,
        })
    );
    // Game c3 = internal (2, 2) -> model (3, 5).
    assert_eq!(
        mv.second,
        Action::Wall(Wall::new(Cell::new(3, 5), WallKind::Right))
    );
}

#[test]
fn parse_resolves_clamped_corner_goal() {
    let config = classic_config(5, 5);
    let (mut board, turn, padding) = convert_bgs_config_to_board(&config, 8, 8).unwrap();

    // Walk the red cat along the open bottom row to model (5, 7), the
    // game's bottom-right cell, two steps from the corner goal at (7, 7).
    while board.position(Player::Red) != Cell::new(5, 7) {
        board
            .take_step(Player::Red, Pawn::Cat, Direction::Right)
            .unwrap();
    }

    // The wire says "Ce1" (the clamp of the corner goal onto the game
    // rectangle); the real destination is the goal itself.
    let mv = parse_move_notation("Ce1", &board, turn, &padding).unwrap();
    let mut replay = board.clone();
    replay.do_action(turn.player, mv.first).unwrap();
    replay.do_action(turn.player, mv.second).unwrap();
    assert_eq!(replay.position(Player::Red), Cell::new(7, 7));
    assert_eq!(replay.winner(), wallwars_core::Winner::Red);
}

#[test]
fn parse_rejects_garbage() {
    let (board, turn, padding) = convert_bgs_config_to_board(&standard_config(8, 8), 8, 8).unwrap();

    for notation in ["", "Ca2Mh1", "Ca2.Mh1.Ca3", "Xa2.Mh1", "Ca2", ">b3", "Ca9.Mh1"] {
        assert!(
            parse_move_notation(notation, &board, turn, &padding).is_err(),
            "expected '{notation}' to fail"
        );
    }
}

#[test]
fn parse_rejects_mouse_moves_in_classic() {
    let (board, turn, padding) = convert_bgs_config_to_board(&classic_config(5, 5), 8, 8).unwrap();
    assert!(matches!(
        parse_move_notation("Ma2.Cb1", &board, turn, &padding),
        Err(AdapterError::MouseMoveInClassic)
    ));
}

#[test]
fn parse_rejects_blocked_pawn_path() {
    let (mut board, turn, padding) =
        convert_bgs_config_to_board(&standard_config(8, 8), 8, 8).unwrap();

    // Wall directly above the red cat at a1 blocks the Up step.
    board
        .place_wall(Player::Blue, Wall::new(Cell::new(0, 6), WallKind::Down))
        .unwrap();
    assert!(parse_move_notation("Ca2.Mh2", &board, turn, &padding).is_err());
}
