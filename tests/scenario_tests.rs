//! Round scenarios driven through the public engine API
//!
//! Each test builds an explicit session (snakes and food placed by hand) so the
//! outcome of every tick is known in advance.

use rand::rngs::StdRng;
use rand::SeedableRng;

use snake_sim::collision::DeathCause;
use snake_sim::config::Config;
use snake_sim::engine::{GameMode, GameSession, Phase, SimulationEngine, TickEvent};
use snake_sim::error::SimError;
use snake_sim::food::FoodSet;
use snake_sim::snake::SnakeEntity;
use snake_sim::types::{Cell, Direction, Player};

/// Board of `columns` x `rows` cells, one pixel per cell, no header
fn board(columns: i32, rows: i32) -> Config {
    board_with_header(columns, rows, 0)
}

/// 10-pixel cells with `header_rows` rows reserved at the top
fn board_with_header(columns: i32, rows: i32, header_rows: i32) -> Config {
    let mut config = Config::default_hardcoded();
    let block_size = if header_rows == 0 { 1 } else { 10 };
    config.board.width = columns * block_size;
    config.board.height = rows * block_size;
    config.board.block_size = block_size;
    config.board.header_height = header_rows * block_size;
    config
}

fn engine(config: Config, mode: GameMode, snakes: Vec<SnakeEntity>, food: Vec<Option<Cell>>) -> SimulationEngine {
    let session = GameSession::new(snakes, FoodSet::from_slots(food));
    SimulationEngine::from_session(&config, mode, session, StdRng::seed_from_u64(42)).unwrap()
}

fn single(head: Cell, direction: Direction, food: Cell) -> SimulationEngine {
    engine(
        board(80, 80),
        GameMode::single_player(),
        vec![SnakeEntity::new(Player::One, head, direction, 3)],
        vec![Some(food)],
    )
}

fn versus(one: SnakeEntity, two: SnakeEntity) -> SimulationEngine {
    engine(
        board(80, 80),
        GameMode::multiplayer(),
        vec![one, two],
        vec![Some(Cell::new(70, 70)), Some(Cell::new(71, 71))],
    )
}

// ============================================================================
// Single player
// ============================================================================

#[test]
fn test_snake_eats_food_ten_cells_ahead() {
    let mut engine = single(Cell::new(40, 40), Direction::Right, Cell::new(50, 40));

    for _ in 0..9 {
        let result = engine.tick().unwrap();
        assert!(result.events.is_empty(), "Nothing should happen before reaching the food");
    }
    let result = engine.tick().unwrap();

    let snake = result.snapshot.snake(Player::One).unwrap();
    assert_eq!(snake.body[0], Cell::new(50, 40));
    assert_eq!(snake.score, 1);
    assert_eq!(snake.body.len(), 4);

    assert!(result.events.contains(&TickEvent::FoodEaten {
        player: Player::One,
        slot: 0,
        cell: Cell::new(50, 40),
    }));
    assert!(result
        .events
        .iter()
        .any(|e| matches!(e, TickEvent::FoodSpawned { slot: 0, .. })));
    assert_eq!(result.snapshot.food.len(), 1);
    assert!(!snake.body.contains(&result.snapshot.food[0]));
}

#[test]
fn test_reversal_intent_is_ignored() {
    let mut engine = single(Cell::new(40, 40), Direction::Right, Cell::new(5, 5));

    engine.set_intent(Player::One, Direction::Left);
    let result = engine.tick().unwrap();

    let snake = result.snapshot.snake(Player::One).unwrap();
    assert_eq!(snake.body[0], Cell::new(41, 40));
    assert_eq!(snake.direction, Direction::Right);
    assert!(!result.is_terminal());
}

#[test]
fn test_last_intent_before_tick_wins() {
    let mut engine = single(Cell::new(40, 40), Direction::Right, Cell::new(5, 5));

    engine.set_intent(Player::One, Direction::Down);
    engine.set_intent(Player::One, Direction::Up);
    let result = engine.tick().unwrap();

    assert_eq!(result.snapshot.snake(Player::One).unwrap().body[0], Cell::new(40, 39));
}

#[test]
fn test_body_length_constant_without_food() {
    let mut engine = single(Cell::new(40, 40), Direction::Right, Cell::new(5, 5));
    let turns = [Direction::Down, Direction::Left, Direction::Up, Direction::Right];

    for step in 0..20 {
        if step % 5 == 0 {
            engine.set_intent(Player::One, turns[(step / 5) % 4]);
        }
        let result = engine.tick().unwrap();
        assert_eq!(result.snapshot.snake(Player::One).unwrap().body.len(), 3);
    }
}

#[test]
fn test_wall_is_fatal_in_single_player() {
    let mut engine = single(Cell::new(79, 40), Direction::Right, Cell::new(5, 5));

    let result = engine.tick().unwrap();

    assert!(result.is_terminal());
    assert_eq!(engine.phase(), Phase::RoundOver);
    assert!(result.events.contains(&TickEvent::SnakeRemoved {
        player: Player::One,
        cause: DeathCause::Wall,
    }));
    assert!(result.snapshot.snake(Player::One).unwrap().body.is_empty());
    // Nothing eaten, nothing to persist
    assert_eq!(engine.summary().persistable_score(), None);
}

#[test]
fn test_every_wall_is_fatal_on_the_exact_tick() {
    // 20x20 cells, rows 0..3 are the header band; each snake starts one step from an edge
    let cases = [
        (Cell::new(5, 4), Direction::Up, Cell::new(5, 3)),
        (Cell::new(1, 10), Direction::Left, Cell::new(0, 10)),
        (Cell::new(5, 18), Direction::Down, Cell::new(5, 19)),
        (Cell::new(18, 10), Direction::Right, Cell::new(19, 10)),
    ];

    for (head, direction, edge) in cases {
        let mut engine = engine(
            board_with_header(20, 20, 3),
            GameMode::single_player(),
            vec![SnakeEntity::new(Player::One, head, direction, 3)],
            vec![Some(Cell::new(10, 12))],
        );

        let result = engine.tick().unwrap();
        assert!(!result.is_terminal(), "{:?}: still on the board", direction);
        assert_eq!(result.snapshot.snake(Player::One).unwrap().body[0], edge);

        let result = engine.tick().unwrap();
        assert!(result.is_terminal(), "{:?}: stepping off the edge is fatal", direction);
        assert!(result.events.contains(&TickEvent::SnakeRemoved {
            player: Player::One,
            cause: DeathCause::Wall,
        }));
        assert_eq!(result.snapshot.tick, 2);
    }
}

#[test]
fn test_running_into_own_body_ends_round() {
    // Length 5 hook: turning down, left then up bites the body
    let mut engine = engine(
        board(80, 80),
        GameMode::single_player(),
        vec![SnakeEntity::new(Player::One, Cell::new(40, 40), Direction::Right, 5)],
        vec![Some(Cell::new(5, 5))],
    );

    engine.set_intent(Player::One, Direction::Down);
    engine.tick().unwrap();
    engine.set_intent(Player::One, Direction::Left);
    engine.tick().unwrap();
    engine.set_intent(Player::One, Direction::Up);
    let result = engine.tick().unwrap();

    assert!(result.is_terminal());
    assert!(result.events.contains(&TickEvent::SnakeRemoved {
        player: Player::One,
        cause: DeathCause::SelfCollision,
    }));
}

#[test]
fn test_finished_single_player_round_is_persistable() {
    let mut engine = single(Cell::new(40, 40), Direction::Right, Cell::new(45, 40));

    let mut ticks = 0;
    while !engine.tick().unwrap().is_terminal() {
        ticks += 1;
        assert!(ticks < 200, "Snake should reach the right wall");
    }

    let summary = engine.summary();
    assert!(summary.finished);
    let score = summary.score_of(Player::One).unwrap();
    assert!(score >= 1);
    assert_eq!(summary.persistable_score(), Some(score));
}

#[test]
fn test_tick_after_round_over_is_an_error() {
    let mut engine = single(Cell::new(79, 40), Direction::Right, Cell::new(5, 5));
    assert!(engine.tick().unwrap().is_terminal());

    assert_eq!(engine.tick().unwrap_err(), SimError::RoundOver { tick: 1 });
    assert_eq!(engine.tick_count(), 1);
}

// ============================================================================
// Multiplayer
// ============================================================================

#[test]
fn test_head_on_equal_lengths_removes_both() {
    let mut engine = versus(
        SnakeEntity::new(Player::One, Cell::new(10, 10), Direction::Right, 3),
        SnakeEntity::new(Player::Two, Cell::new(12, 10), Direction::Left, 3),
    );

    let result = engine.tick().unwrap();

    assert!(result.is_terminal());
    assert_eq!(result.winner(), None);
    assert!(result.snapshot.snakes.iter().all(|s| !s.alive && s.body.is_empty()));
    assert!(result.events.contains(&TickEvent::SnakeRemoved {
        player: Player::One,
        cause: DeathCause::Tie { against: Player::Two },
    }));
    assert!(result.events.contains(&TickEvent::RoundOver { winner: None }));
    assert_eq!(engine.summary().persistable_score(), None);
}

#[test]
fn test_head_on_longer_snake_survives() {
    let mut engine = versus(
        SnakeEntity::new(Player::One, Cell::new(10, 10), Direction::Right, 5),
        SnakeEntity::new(Player::Two, Cell::new(12, 10), Direction::Left, 3),
    );

    let result = engine.tick().unwrap();

    assert!(!result.is_terminal(), "Round continues with one survivor");
    assert_eq!(result.winner(), Some(Player::One));
    let one = result.snapshot.snake(Player::One).unwrap();
    assert!(one.alive);
    assert_eq!(one.body[0], Cell::new(11, 10));
    assert_eq!(one.body.len(), 5);
    assert!(!result.snapshot.snake(Player::Two).unwrap().alive);
    assert!(result.events.contains(&TickEvent::SnakeRemoved {
        player: Player::Two,
        cause: DeathCause::LostArbitration { against: Player::One },
    }));

    // Winner is kept while the survivor plays on
    for _ in 0..5 {
        let result = engine.tick().unwrap();
        assert_eq!(result.winner(), Some(Player::One));
    }
}

#[test]
fn test_moving_into_vacated_tail_is_safe() {
    // Player One steps onto the cell Player Two's tail leaves this tick
    let mut engine = versus(
        SnakeEntity::new(Player::One, Cell::new(3, 6), Direction::Up, 3),
        SnakeEntity::new(Player::Two, Cell::new(5, 5), Direction::Right, 3),
    );

    let result = engine.tick().unwrap();

    assert!(result.snapshot.snakes.iter().all(|s| s.alive));
    assert_eq!(result.snapshot.snake(Player::One).unwrap().body[0], Cell::new(3, 5));
    assert_eq!(result.winner(), None);
}

#[test]
fn test_intents_for_dead_snake_are_dropped() {
    let mut engine = versus(
        SnakeEntity::new(Player::One, Cell::new(10, 10), Direction::Right, 5),
        SnakeEntity::new(Player::Two, Cell::new(12, 10), Direction::Left, 3),
    );
    engine.tick().unwrap();

    engine.set_intent(Player::Two, Direction::Up);
    let result = engine.tick().unwrap();
    assert!(result.snapshot.snake(Player::Two).unwrap().body.is_empty());
}

#[test]
fn test_wrap_on_every_edge() {
    let cases = [
        (Cell::new(19, 5), Direction::Right, Cell::new(0, 5)),
        (Cell::new(0, 5), Direction::Left, Cell::new(19, 5)),
        (Cell::new(5, 0), Direction::Up, Cell::new(5, 19)),
        (Cell::new(5, 19), Direction::Down, Cell::new(5, 0)),
    ];

    for (head, direction, expected) in cases {
        let mut engine = engine(
            board(20, 20),
            GameMode::multiplayer(),
            vec![
                SnakeEntity::new(Player::One, head, direction, 3),
                SnakeEntity::new(Player::Two, Cell::new(12, 12), Direction::Right, 3),
            ],
            vec![Some(Cell::new(15, 2)), Some(Cell::new(2, 15))],
        );

        let result = engine.tick().unwrap();
        let one = result.snapshot.snake(Player::One).unwrap();
        assert!(one.alive, "{:?} wrap should not be fatal", direction);
        assert_eq!(one.body[0], expected, "{:?} wrap from {}", direction, head);
    }
}

#[test]
fn test_wrap_skips_header_rows() {
    // 20x20 cells with a 3-row header: playable rows are 3..20
    let mut engine = engine(
        board_with_header(20, 20, 3),
        GameMode::multiplayer(),
        vec![
            SnakeEntity::new(Player::One, Cell::new(5, 3), Direction::Up, 3),
            SnakeEntity::new(Player::Two, Cell::new(12, 12), Direction::Right, 3),
        ],
        vec![Some(Cell::new(15, 5)), Some(Cell::new(2, 15))],
    );

    let result = engine.tick().unwrap();
    assert_eq!(result.snapshot.snake(Player::One).unwrap().body[0], Cell::new(5, 19));
}

// ============================================================================
// Seeded rounds
// ============================================================================

#[test]
fn test_food_never_spawns_on_a_snake() {
    let config = snake_sim::config::Config::default_hardcoded();
    let mut engine = SimulationEngine::with_seed(&config, GameMode::multiplayer(), 7).unwrap();
    let turns = [Direction::Up, Direction::Left, Direction::Down, Direction::Right];

    for step in 0..300 {
        if step % 7 == 0 {
            engine.set_intent(Player::One, turns[(step / 7) % 4]);
            engine.set_intent(Player::Two, turns[(step / 7 + 1) % 4]);
        }
        let result = engine.tick().unwrap();
        let occupied: Vec<Cell> = result
            .snapshot
            .snakes
            .iter()
            .flat_map(|s| s.body.iter().copied())
            .collect();
        for food in &result.snapshot.food {
            assert!(!occupied.contains(food), "Food at {} overlaps a snake", food);
            assert!(result.snapshot.board.is_in_bounds(*food));
        }
        if result.is_terminal() {
            break;
        }
    }
}

#[test]
fn test_same_seed_same_round() {
    let config = snake_sim::config::Config::default_hardcoded();
    let mut a = SimulationEngine::with_seed(&config, GameMode::single_player(), 99).unwrap();
    let mut b = SimulationEngine::with_seed(&config, GameMode::single_player(), 99).unwrap();

    assert_eq!(a.snapshot(), b.snapshot());
    for _ in 0..20 {
        assert_eq!(a.tick().unwrap().snapshot, b.tick().unwrap().snapshot);
    }
}

#[test]
fn test_reset_starts_a_fresh_round() {
    let config = snake_sim::config::Config::default_hardcoded();
    let mut engine = SimulationEngine::with_seed(&config, GameMode::single_player(), 3).unwrap();
    engine.set_intent(Player::One, Direction::Up);
    while !engine.tick().unwrap().is_terminal() {}

    engine.reset().unwrap();
    assert_eq!(engine.phase(), Phase::Running);
    assert_eq!(engine.tick_count(), 0);
    assert!(engine.tick().is_ok());
}
