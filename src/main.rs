// Headless terminal driver for the snake simulation
//
// Usage:
//   snake-sim [OPTIONS]
//
// Intents are read from stdin, whitespace separated:
//   up/down/left/right  -> player 1
//   w/a/s/d             -> player 2 (player 1 in a single-player round)
//   q / quit            -> stop playing

use log::{error, info, warn};
use std::env;
use std::io::BufRead;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use snake_sim::config::Config;
use snake_sim::engine::{GameMode, RoundSummary, SimulationEngine, TickEvent};
use snake_sim::error::SimError;
use snake_sim::scores::{JsonlScoreStore, ScoreRecorder};
use snake_sim::tick_logger::TickLogger;
use snake_sim::types::{Direction, Player};

#[derive(Debug)]
enum Input {
    Intent(Player, Direction),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundEnd {
    Finished,
    Quit,
}

#[derive(Debug)]
struct Options {
    players: usize,
    /// Indexed by `Player::index()`
    names: [String; 2],
    rounds: u32,
    config_path: Option<String>,
    highscores_only: bool,
}

impl Options {
    /// Name shown for a player; falls back to "Player N"
    fn display_name(&self, player: Player) -> String {
        let name = self.names[player.index()].trim();
        if name.is_empty() {
            player.to_string()
        } else {
            name.to_string()
        }
    }
}

fn print_usage() {
    eprintln!("Snake simulation driver");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  snake-sim [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --players <1|2>     Single player (default) or two-player rounds");
    eprintln!("  --name <NAME>       Player 1 name, saved with single-player scores");
    eprintln!("  --name2 <NAME>      Player 2 name");
    eprintln!("  --rounds <N>        Rounds to play before exiting (default: 1)");
    eprintln!("  --config <path>     Path to Game.toml (default: Game.toml)");
    eprintln!("  --highscores        Print the top scores and exit");
    eprintln!("  --help              Show this help message");
    eprintln!();
    eprintln!("INPUT (stdin):");
    eprintln!("  up down left right  steer player 1");
    eprintln!("  w a s d             steer player 2 (player 1 when playing alone)");
    eprintln!("  q                   quit");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        players: 1,
        names: [String::new(), String::new()],
        rounds: 1,
        config_path: None,
        highscores_only: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--players" => {
                i += 1;
                let value = args.get(i).ok_or("--players requires a value")?;
                options.players = value
                    .parse::<usize>()
                    .map_err(|e| format!("Invalid player count '{}': {}", value, e))?;
            }
            "--name" => {
                i += 1;
                options.names[0] = args.get(i).ok_or("--name requires a value")?.clone();
            }
            "--name2" => {
                i += 1;
                options.names[1] = args.get(i).ok_or("--name2 requires a value")?.clone();
            }
            "--rounds" => {
                i += 1;
                let value = args.get(i).ok_or("--rounds requires a value")?;
                options.rounds = match value.parse::<u32>() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(format!("Invalid round count '{}'", value)),
                };
            }
            "--config" => {
                i += 1;
                options.config_path = Some(args.get(i).ok_or("--config requires a path")?.clone());
            }
            "--highscores" => options.highscores_only = true,
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    Ok(options)
}

fn parse_token(token: &str, mode: GameMode) -> Option<Input> {
    let wasd_player = if mode.is_single_player() {
        Player::One
    } else {
        Player::Two
    };
    match token.to_lowercase().as_str() {
        "q" | "quit" => Some(Input::Quit),
        "w" => Some(Input::Intent(wasd_player, Direction::Up)),
        "a" => Some(Input::Intent(wasd_player, Direction::Left)),
        "s" => Some(Input::Intent(wasd_player, Direction::Down)),
        "d" => Some(Input::Intent(wasd_player, Direction::Right)),
        other => Direction::parse(other)
            .ok()
            .map(|dir| Input::Intent(Player::One, dir)),
    }
}

/// Input collaborator: forwards tokens from `reader` to the game loop.
///
/// Runs on its own OS thread because a blocking terminal read cannot be
/// cancelled; the thread is never joined, so a pending read does not keep
/// the process alive once the rounds are over.
fn spawn_input_reader<R>(reader: R, tx: UnboundedSender<Input>, mode: GameMode)
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            for token in line.split_whitespace() {
                match parse_token(token, mode) {
                    Some(input) => {
                        if tx.send(input).is_err() {
                            return;
                        }
                    }
                    None => warn!("Ignoring unknown input '{}'", token),
                }
            }
        }
    });
}

/// Ticks one round on the frame clock until it ends or the player quits
async fn play_round(
    engine: &mut SimulationEngine,
    rx: &mut UnboundedReceiver<Input>,
    tick_logger: &TickLogger,
    tick_interval: Duration,
    options: &Options,
) -> Result<RoundEnd, SimError> {
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        interval.tick().await;

        while let Ok(input) = rx.try_recv() {
            match input {
                Input::Intent(player, direction) => engine.set_intent(player, direction),
                Input::Quit => {
                    info!("Round abandoned at tick {}", engine.tick_count());
                    return Ok(RoundEnd::Quit);
                }
            }
        }

        let result = engine.tick()?;
        tick_logger.log_tick(&result);

        for event in &result.events {
            if let TickEvent::SnakeRemoved { player, cause } = event {
                println!("{} is out: {:?}", options.display_name(*player), cause);
            }
        }

        if result.is_terminal() {
            return Ok(RoundEnd::Finished);
        }
    }
}

/// Plays up to `options.rounds` rounds, resetting the engine between them.
/// Each round's summary is printed and a persistable score is recorded.
async fn play_rounds(
    engine: &mut SimulationEngine,
    rx: &mut UnboundedReceiver<Input>,
    tick_logger: &TickLogger,
    recorder: &ScoreRecorder,
    tick_interval: Duration,
    options: &Options,
) -> Result<Vec<RoundSummary>, SimError> {
    let mut summaries = Vec::new();

    for round in 1..=options.rounds {
        if round > 1 {
            engine.reset()?;
            // Steering typed between rounds belongs to the old round
            while let Ok(input) = rx.try_recv() {
                if let Input::Quit = input {
                    return Ok(summaries);
                }
            }
        }
        info!(
            "Round {}/{} started ({} player(s))",
            round,
            options.rounds,
            engine.mode().players
        );

        let end = play_round(engine, rx, tick_logger, tick_interval, options).await?;

        let summary = engine.summary();
        print_summary(&summary, options);

        if let Some(save) = recorder.record_round(&options.names[0], &summary) {
            match save.await {
                Ok(true) => {}
                Ok(false) => eprintln!("Score could not be saved"),
                Err(e) => error!("Score task failed: {}", e),
            }
        }

        summaries.push(summary);
        if end == RoundEnd::Quit {
            break;
        }
    }

    Ok(summaries)
}

fn winner_line(summary: &RoundSummary, options: &Options) -> String {
    match summary.winner {
        Some(w) => format!("Winner:         {}", options.display_name(w)),
        None => "Winner:         none (tie)".to_string(),
    }
}

fn print_summary(summary: &RoundSummary, options: &Options) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!(
        "                      {}",
        if summary.finished { "ROUND OVER" } else { "ROUND ABANDONED" }
    );
    println!("═══════════════════════════════════════════════════════════");
    println!("Ticks:          {}", summary.ticks);
    for s in &summary.scores {
        println!(
            "{:<15} {}{}",
            format!("{}:", options.display_name(s.player)),
            s.score,
            if s.alive { " (alive)" } else { "" }
        );
    }
    if !summary.mode.is_single_player() && summary.finished {
        println!("{}", winner_line(summary, options));
    }
    println!("═══════════════════════════════════════════════════════════\n");
}

fn print_top_scores(recorder: &ScoreRecorder, limit: usize) {
    let scores = recorder.top_scores(limit);
    println!("Highscores");
    if scores.is_empty() {
        println!("  no scores recorded");
        return;
    }
    for (i, entry) in scores.iter().enumerate() {
        println!(
            "  {}. {} - {} ({})",
            i + 1,
            entry.name,
            entry.score,
            entry.achieved_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

#[tokio::main]
async fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.contains(&"--help".to_string()) {
        print_usage();
        return;
    }

    let options = match parse_args(&args) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    let config = match &options.config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => Config::load_or_default(),
    };

    let recorder = ScoreRecorder::new(Arc::new(JsonlScoreStore::new(&config.scores.store_path)));
    if options.highscores_only {
        print_top_scores(&recorder, config.scores.top_limit);
        return;
    }

    let mode = match GameMode::for_players(options.players) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut engine = match SimulationEngine::new(&config, mode) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Could not start round: {}", e);
            process::exit(1);
        }
    };

    let tick_logger = TickLogger::new(config.debug.enabled, &config.debug.log_file_path).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_input_reader(std::io::BufReader::new(std::io::stdin()), tx, mode);

    let tick_interval = Duration::from_millis(config.timing.tick_interval_ms.max(1));
    let outcome = play_rounds(
        &mut engine,
        &mut rx,
        &tick_logger,
        &recorder,
        tick_interval,
        &options,
    )
    .await;
    tick_logger.finish().await;

    if let Err(e) = outcome {
        error!("Simulation invariant violated: {}", e);
        process::exit(1);
    }

    print_top_scores(&recorder, config.scores.top_limit);
}
