// Simulation engine: one complete tick across one or two snakes
//
// Single player and multiplayer are the same engine under a different `GameMode`
// (player count, boundary policy, food slots). `tick()` runs, in order:
//   (a) resolve_direction for each live snake
//   (b) advance to candidate heads
//   (c) collision evaluation
//   (d) body commit and food consumption for survivors
//   (e) food respawn into emptied slots
//   (f) terminal check

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::collision::{BoundaryPolicy, CollisionResolver, DeathCause, Fate, MoveCandidate};
use crate::config::Config;
use crate::error::{Result, SimError};
use crate::food::{FoodSet, FoodSpawner};
use crate::grid::Board;
use crate::snake::SnakeEntity;
use crate::types::{Cell, Direction, Player};

/// Tagged configuration selecting single player or multiplayer rules
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameMode {
    pub players: usize,
    pub boundary: BoundaryPolicy,
    pub food_slots: usize,
}

impl GameMode {
    /// One snake, one food, the wall is fatal
    pub fn single_player() -> Self {
        GameMode {
            players: 1,
            boundary: BoundaryPolicy::ClampAndDie,
            food_slots: 1,
        }
    }

    /// Two snakes, two food, edges wrap
    pub fn multiplayer() -> Self {
        GameMode {
            players: 2,
            boundary: BoundaryPolicy::Wrap,
            food_slots: 2,
        }
    }

    pub fn for_players(players: usize) -> Result<Self> {
        match players {
            1 => Ok(Self::single_player()),
            2 => Ok(Self::multiplayer()),
            n => Err(SimError::InvalidMode(format!(
                "player count must be 1 or 2, got {}",
                n
            ))),
        }
    }

    pub fn is_single_player(&self) -> bool {
        self.players == 1
    }

    fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.players) {
            return Err(SimError::InvalidMode(format!(
                "player count must be 1 or 2, got {}",
                self.players
            )));
        }
        if !(1..=2).contains(&self.food_slots) {
            return Err(SimError::InvalidMode(format!(
                "food slot count must be 1 or 2, got {}",
                self.food_slots
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Running,
    RoundOver,
}

/// Snakes, food and the round outcome
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    snakes: Vec<SnakeEntity>,
    food: FoodSet,
    terminal: bool,
    winner: Option<Player>,
}

impl GameSession {
    pub fn new(snakes: Vec<SnakeEntity>, food: FoodSet) -> Self {
        GameSession {
            snakes,
            food,
            terminal: false,
            winner: None,
        }
    }

    pub fn snakes(&self) -> &[SnakeEntity] {
        &self.snakes
    }

    pub fn snake(&self, player: Player) -> Option<&SnakeEntity> {
        self.snakes.iter().find(|s| s.player() == player)
    }

    fn snake_mut(&mut self, player: Player) -> Option<&mut SnakeEntity> {
        self.snakes.iter_mut().find(|s| s.player() == player)
    }

    pub fn food(&self) -> &FoodSet {
        &self.food
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Every cell covered by a living snake
    pub fn occupied_cells(&self) -> HashSet<Cell> {
        self.snakes
            .iter()
            .flat_map(|s| s.body().iter().copied())
            .collect()
    }
}

/// Something that happened during a tick
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum TickEvent {
    FoodEaten { player: Player, slot: usize, cell: Cell },
    FoodSpawned { slot: usize, cell: Cell },
    SnakeRemoved { player: Player, cause: DeathCause },
    RoundOver { winner: Option<Player> },
}

/// Read-only view of one snake for the render collaborator
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SnakeView {
    pub player: Player,
    pub body: Vec<Cell>,
    pub direction: Direction,
    pub score: u32,
    pub alive: bool,
}

/// Everything the render collaborator needs for one frame
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub tick: u64,
    pub board: Board,
    pub snakes: Vec<SnakeView>,
    pub food: Vec<Cell>,
    pub terminal: bool,
    pub winner: Option<Player>,
}

impl Snapshot {
    pub fn snake(&self, player: Player) -> Option<&SnakeView> {
        self.snakes.iter().find(|s| s.player == player)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    pub snapshot: Snapshot,
    pub events: Vec<TickEvent>,
}

impl TickResult {
    pub fn is_terminal(&self) -> bool {
        self.snapshot.terminal
    }

    pub fn winner(&self) -> Option<Player> {
        self.snapshot.winner
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerScore {
    pub player: Player,
    pub score: u32,
    pub alive: bool,
}

/// Final (or current) standing of a round
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub mode: GameMode,
    pub ticks: u64,
    pub scores: Vec<PlayerScore>,
    pub winner: Option<Player>,
    pub finished: bool,
}

impl RoundSummary {
    /// Score to hand to the persistence collaborator: finished single-player rounds with
    /// a strictly positive score. Multiplayer rounds are never persisted.
    pub fn persistable_score(&self) -> Option<u32> {
        if !self.finished || !self.mode.is_single_player() {
            return None;
        }
        self.scores
            .first()
            .map(|s| s.score)
            .filter(|score| *score > 0)
    }

    pub fn score_of(&self, player: Player) -> Option<u32> {
        self.scores
            .iter()
            .find(|s| s.player == player)
            .map(|s| s.score)
    }
}

pub struct SimulationEngine {
    board: Board,
    mode: GameMode,
    initial_length: usize,
    spawn_offset: i32,
    resolver: CollisionResolver,
    spawner: FoodSpawner,
    session: GameSession,
    phase: Phase,
    tick: u64,
    rng: StdRng,
}

impl SimulationEngine {
    /// Starts a round using the configured board and rules, seeded from the OS
    pub fn new(config: &Config, mode: GameMode) -> Result<Self> {
        Self::with_rng(config, mode, StdRng::from_os_rng())
    }

    /// Same as `new` with a fixed seed
    pub fn with_seed(config: &Config, mode: GameMode, seed: u64) -> Result<Self> {
        Self::with_rng(config, mode, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: &Config, mode: GameMode, rng: StdRng) -> Result<Self> {
        let mut engine = Self::configured(
            config,
            mode,
            GameSession::new(Vec::new(), FoodSet::with_slots(mode.food_slots)),
            rng,
        )?;
        engine.session = engine.starting_session()?;
        Ok(engine)
    }

    /// Starts from an explicit session; empty food slots are filled immediately.
    /// Board, rules and spawn cap come from `config`, so `reset()` afterwards
    /// builds the configured starting layout.
    pub fn from_session(
        config: &Config,
        mode: GameMode,
        session: GameSession,
        rng: StdRng,
    ) -> Result<Self> {
        if session.snakes.len() != mode.players {
            return Err(SimError::InvalidMode(format!(
                "mode expects {} snake(s), session has {}",
                mode.players,
                session.snakes.len()
            )));
        }
        if session.food.slot_count() != mode.food_slots {
            return Err(SimError::InvalidMode(format!(
                "mode expects {} food slot(s), session has {}",
                mode.food_slots,
                session.food.slot_count()
            )));
        }

        let mut engine = Self::configured(config, mode, session, rng)?;
        let occupied = engine.session.occupied_cells();
        engine
            .spawner
            .top_up(&mut engine.session.food, &occupied, &mut engine.rng)?;
        Ok(engine)
    }

    fn configured(
        config: &Config,
        mode: GameMode,
        session: GameSession,
        rng: StdRng,
    ) -> Result<Self> {
        mode.validate()?;
        let board = config.board()?;

        Ok(SimulationEngine {
            board,
            mode,
            initial_length: config.rules.initial_length.max(1),
            spawn_offset: config.rules.multiplayer_spawn_offset,
            resolver: CollisionResolver::new(board, mode.boundary),
            spawner: FoodSpawner::new(board, config.food.spawn_attempt_cap),
            session,
            phase: Phase::Running,
            tick: 0,
            rng,
        })
    }

    /// Snakes side by side on the middle playable row, all facing right
    fn starting_session(&mut self) -> Result<GameSession> {
        let center_x = self.board.columns() / 2;
        let center_y = self.board.header_rows() + self.board.playable_rows() / 2;

        let mut snakes = Vec::with_capacity(self.mode.players);
        for (i, player) in Player::all().iter().take(self.mode.players).enumerate() {
            let head = Cell::new(center_x + self.spawn_offset * i as i32, center_y);
            snakes.push(SnakeEntity::new(
                *player,
                head,
                Direction::Right,
                self.initial_length,
            ));
        }

        let mut seen = HashSet::new();
        for snake in &snakes {
            for cell in snake.body() {
                if !self.board.is_in_bounds(*cell) || !seen.insert(*cell) {
                    return Err(SimError::InvalidMode(format!(
                        "starting layout does not fit the board: {} at {}",
                        snake.player(),
                        cell
                    )));
                }
            }
        }

        let mut session = GameSession::new(snakes, FoodSet::with_slots(self.mode.food_slots));
        let occupied = session.occupied_cells();
        self.spawner
            .top_up(&mut session.food, &occupied, &mut self.rng)?;

        info!(
            "New round: {} player(s), {:?} boundary, {}x{} playable cells",
            self.mode.players,
            self.mode.boundary,
            self.board.columns(),
            self.board.playable_rows()
        );
        Ok(session)
    }

    /// Discards the current round and starts a fresh one with the same mode
    pub fn reset(&mut self) -> Result<()> {
        self.session = self.starting_session()?;
        self.phase = Phase::Running;
        self.tick = 0;
        Ok(())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn winner(&self) -> Option<Player> {
        self.session.winner
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Buffers a direction for the next tick. Intents for absent or dead snakes are dropped.
    pub fn set_intent(&mut self, player: Player, direction: Direction) {
        match self.session.snake_mut(player) {
            Some(snake) if snake.is_alive() => snake.set_intent(direction),
            Some(_) => debug!("Dropping intent for removed {}", player),
            None => warn!(
                "Dropping intent for {}: not part of this {}-player round",
                player, self.mode.players
            ),
        }
    }

    /// Advances the simulation by one tick
    ///
    /// # Errors
    /// `SimError::RoundOver` if the round already ended, `SimError::FoodSpawnExhausted`
    /// if food could not be placed. Both are fatal for the round.
    pub fn tick(&mut self) -> Result<TickResult> {
        if self.phase == Phase::RoundOver {
            return Err(SimError::RoundOver { tick: self.tick });
        }
        self.tick += 1;
        let mut events = Vec::new();

        // (a)
        for snake in self.session.snakes.iter_mut().filter(|s| s.is_alive()) {
            snake.resolve_direction();
        }

        // (b) + (c)
        let resolution = {
            let candidates: Vec<MoveCandidate<'_>> = self
                .session
                .snakes
                .iter()
                .filter_map(|snake| snake.advance().map(|head| MoveCandidate { snake, head }))
                .collect();
            self.resolver.resolve(&candidates, &self.session.food)
        };

        // (d)
        for verdict in &resolution.verdicts {
            match verdict.fate {
                Fate::Moves { head, ate_food } => {
                    if ate_food {
                        if let Some(slot) = self.session.food.slot_of(head) {
                            self.session.food.take(slot);
                            events.push(TickEvent::FoodEaten {
                                player: verdict.player,
                                slot,
                                cell: head,
                            });
                        }
                    }
                    if let Some(snake) = self.session.snake_mut(verdict.player) {
                        snake.grow_or_shrink(head, ate_food);
                        if ate_food {
                            info!(
                                "Tick {}: {} ate food at {} (score {})",
                                self.tick,
                                verdict.player,
                                head,
                                snake.score()
                            );
                        }
                    }
                }
                Fate::Dies(cause) => {
                    if let Some(snake) = self.session.snake_mut(verdict.player) {
                        snake.kill();
                    }
                    info!("Tick {}: {} removed ({:?})", self.tick, verdict.player, cause);
                    events.push(TickEvent::SnakeRemoved {
                        player: verdict.player,
                        cause,
                    });
                }
            }
        }
        if let Some(winner) = resolution.winner {
            self.session.winner = Some(winner);
        }

        // (e)
        let occupied = self.session.occupied_cells();
        let placed = self
            .spawner
            .top_up(&mut self.session.food, &occupied, &mut self.rng)?;
        for (slot, cell) in placed {
            debug!("Tick {}: food slot {} respawned at {}", self.tick, slot, cell);
            events.push(TickEvent::FoodSpawned { slot, cell });
        }

        // (f)
        if self.session.snakes.iter().all(|s| !s.is_alive()) {
            self.session.terminal = true;
            self.phase = Phase::RoundOver;
            info!(
                "Round over after {} tick(s); winner: {}",
                self.tick,
                self.session
                    .winner
                    .map(|w| w.to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
            events.push(TickEvent::RoundOver {
                winner: self.session.winner,
            });
        }

        debug!(
            "Tick {}: heads {:?}, food {:?}",
            self.tick,
            self.session
                .snakes
                .iter()
                .map(|s| s.head())
                .collect::<Vec<_>>(),
            self.session.food.cells()
        );

        Ok(TickResult {
            snapshot: self.snapshot(),
            events,
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            board: self.board,
            snakes: self
                .session
                .snakes
                .iter()
                .map(|s| SnakeView {
                    player: s.player(),
                    body: s.body().to_vec(),
                    direction: s.direction(),
                    score: s.score(),
                    alive: s.is_alive(),
                })
                .collect(),
            food: self.session.food.cells(),
            terminal: self.session.terminal,
            winner: self.session.winner,
        }
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            mode: self.mode,
            ticks: self.tick,
            scores: self
                .session
                .snakes
                .iter()
                .map(|s| PlayerScore {
                    player: s.player(),
                    score: s.score(),
                    alive: s.is_alive(),
                })
                .collect(),
            winner: self.session.winner,
            finished: self.phase == Phase::RoundOver,
        }
    }
}
