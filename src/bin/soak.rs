//! Soak runner: plays many seeded rounds with random steering in parallel
//!
//! Every tick is checked against the simulation's invariants:
//! - live bodies stay inside the playable area
//! - no two live body cells overlap
//! - food never sits on a snake
//! - body length equals starting length plus score
//! - a terminal round has no live snakes
//!
//! Usage:
//!   cargo run --release --bin soak -- <sessions> [players] [max_ticks]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashSet;
use std::env;
use std::time::Instant;

use snake_sim::config::Config;
use snake_sim::engine::{GameMode, Snapshot};
use snake_sim::types::{Direction, Player};
use snake_sim::SimulationEngine;

#[derive(Debug, Default, Clone)]
struct SessionStats {
    ticks: u64,
    food_eaten: u64,
    finished: bool,
    winner: Option<Player>,
}

fn check_invariants(snapshot: &Snapshot, initial_length: usize) -> Result<(), String> {
    let board = &snapshot.board;
    let mut seen = HashSet::new();

    for snake in snapshot.snakes.iter().filter(|s| s.alive) {
        if snake.body.len() != initial_length + snake.score as usize {
            return Err(format!(
                "tick {}: {} has length {} with score {}",
                snapshot.tick,
                snake.player,
                snake.body.len(),
                snake.score
            ));
        }
        for cell in &snake.body {
            if !board.is_in_bounds(*cell) {
                return Err(format!("tick {}: {} outside playable area at {}", snapshot.tick, snake.player, cell));
            }
            if !seen.insert(*cell) {
                return Err(format!("tick {}: overlapping body cell {}", snapshot.tick, cell));
            }
        }
    }

    if let Some(food) = snapshot.food.iter().find(|f| seen.contains(f)) {
        return Err(format!("tick {}: food on a snake at {}", snapshot.tick, food));
    }

    if snapshot.terminal && snapshot.snakes.iter().any(|s| s.alive) {
        return Err(format!("tick {}: terminal round with a live snake", snapshot.tick));
    }

    Ok(())
}

fn run_session(config: &Config, mode: GameMode, seed: u64, max_ticks: u64) -> Result<SessionStats, String> {
    let mut engine = SimulationEngine::with_seed(config, mode, seed).map_err(|e| e.to_string())?;
    let mut steering = StdRng::seed_from_u64(seed.wrapping_mul(31).wrapping_add(7));
    let initial_length = config.rules.initial_length.max(1);
    let mut stats = SessionStats::default();

    while stats.ticks < max_ticks {
        for player in Player::all().iter().take(mode.players) {
            // Steer roughly one tick in four
            if steering.random_range(0..4) == 0 {
                let dir = Direction::all()[steering.random_range(0..4)];
                engine.set_intent(*player, dir);
            }
        }

        let result = engine
            .tick()
            .map_err(|e| format!("seed {}: {}", seed, e))?;
        stats.ticks += 1;
        stats.food_eaten += result
            .events
            .iter()
            .filter(|e| matches!(e, snake_sim::TickEvent::FoodEaten { .. }))
            .count() as u64;

        check_invariants(&result.snapshot, initial_length).map_err(|e| format!("seed {}: {}", seed, e))?;

        if result.is_terminal() {
            stats.finished = true;
            stats.winner = result.winner();
            break;
        }
    }

    Ok(stats)
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <sessions> [players] [max_ticks]", args[0]);
        eprintln!("Example: {} 1000 2 5000", args[0]);
        std::process::exit(1);
    }

    let sessions: u64 = args[1].parse().unwrap_or_else(|_| {
        eprintln!("Error: sessions must be a number, got: {}", args[1]);
        std::process::exit(1);
    });
    let players: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(1);
    let max_ticks: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(5000);

    let mode = match GameMode::for_players(players) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let config = Config::load_or_default();

    println!("═══════════════════════════════════════════════════════════");
    println!("       SOAK RUN");
    println!("═══════════════════════════════════════════════════════════");
    println!("Sessions:   {}", sessions);
    println!("Players:    {}", players);
    println!("Max ticks:  {}", max_ticks);
    println!("Threads:    {}", rayon::current_num_threads());
    println!();

    let start = Instant::now();
    let results: Vec<Result<SessionStats, String>> = (0..sessions)
        .into_par_iter()
        .map(|seed| run_session(&config, mode, seed, max_ticks))
        .collect();
    let elapsed = start.elapsed();

    let mut failures = Vec::new();
    let mut total_ticks = 0u64;
    let mut total_food = 0u64;
    let mut finished = 0u64;
    let mut wins = [0u64; 2];
    let mut ties = 0u64;

    for result in results {
        match result {
            Ok(stats) => {
                total_ticks += stats.ticks;
                total_food += stats.food_eaten;
                if stats.finished {
                    finished += 1;
                    match stats.winner {
                        Some(p) => wins[p.index()] += 1,
                        None => ties += 1,
                    }
                }
            }
            Err(e) => failures.push(e),
        }
    }

    println!("Ticks simulated:  {}", total_ticks);
    println!("Food eaten:       {}", total_food);
    println!("Rounds finished:  {}/{}", finished, sessions);
    if !mode.is_single_player() {
        println!("Player 1 wins:    {}", wins[0]);
        println!("Player 2 wins:    {}", wins[1]);
        println!("No winner:        {}", ties);
    }
    println!(
        "Elapsed:          {:.2}s ({:.0} ticks/s)",
        elapsed.as_secs_f64(),
        total_ticks as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    if failures.is_empty() {
        println!("\n✓ All invariants held");
    } else {
        println!("\n✗ {} session(s) failed:", failures.len());
        for failure in failures.iter().take(20) {
            println!("  {}", failure);
        }
        std::process::exit(1);
    }
}
