//! Othello-variant AlphaZero driver.
//!
//! - `othello init` - Write a fresh best model
//! - `othello selfplay` - Play games with the best model and save NPY training data
//! - `othello train` - Run self-play / train / evaluate / promote cycles
//! - `othello play` - Play against the best model in the terminal

mod config;
mod play;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::{unbounded, Sender};
use othello_core::{BoardConfig, GameState, Player};
use othello_mcts::{Mcts, MctsConfig};
use othello_nn::NnModel;
use othello_selfplay::{
    game_to_training_examples, play_games_parallel, save_training_data, ModelRepository,
    NpyModelRepository, SelfPlayConfig, SelfPlayStream, SgdTrainer, TrainingCycle,
};

use crate::config::{load_config, Overrides};
use crate::play::{render, Effect, Event, Input, Phase, PlaySession};

#[derive(Parser)]
#[command(name = "othello")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file (board, self-play, evaluation and trainer settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the `best/` and `latest/` models
    #[arg(long, global = true, default_value = "models")]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a randomly initialised best model
    Init {
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Replace an existing best model
        #[arg(long)]
        force: bool,
    },
    /// Play self-play games with the best model and save them as NPY files
    Selfplay {
        /// Output prefix; writes `{output}_states.npy` and friends
        #[arg(long, default_value = "data/selfplay")]
        output: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Run the training cycle
    Train {
        #[arg(long)]
        cycles: Option<usize>,

        #[arg(long)]
        eval_games: Option<usize>,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Play against the best model
    Play {
        /// MCTS simulations per AI move
        #[arg(long)]
        simulations: Option<u32>,

        /// Let the AI move first
        #[arg(long)]
        ai_first: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let file = load_config(cli.config.as_deref())?;
    let mut repository = NpyModelRepository::new(&cli.model_dir);

    match cli.command {
        Commands::Init { seed, force } => init(&mut repository, &file.cycle.board, seed, force),
        Commands::Selfplay { output, overrides } => {
            let cycle = overrides.apply(file.cycle);
            selfplay(&repository, &cycle.board, &cycle.self_play, &output)
        }
        Commands::Train {
            cycles,
            eval_games,
            overrides,
        } => {
            let mut cycle = overrides.apply(file.cycle);
            if let Some(cycles) = cycles {
                cycle.cycles = cycles;
            }
            if let Some(games) = eval_games {
                cycle.eval_games = games;
            }
            ensure_best_model(&mut repository, &cycle.board)?;

            let trainer = SgdTrainer::new(file.trainer);
            let mut training = TrainingCycle::new(cycle, repository, trainer);
            let summary = training.run()?;
            for report in &summary.cycles {
                println!(
                    "cycle {:>3}: {} examples, score {:.3}{}",
                    report.cycle,
                    report.examples,
                    report.evaluation.score(),
                    if report.promoted { " (promoted)" } else { "" }
                );
            }
            Ok(())
        }
        Commands::Play {
            simulations,
            ai_first,
        } => {
            let mut mcts = file.cycle.eval_mcts();
            if let Some(simulations) = simulations {
                mcts.num_simulations = simulations;
            }
            let human = if ai_first { Player::Second } else { Player::First };
            play(&repository, file.cycle.board, mcts, human)
        }
    }
}

fn init(
    repository: &mut NpyModelRepository,
    board: &BoardConfig,
    seed: u64,
    force: bool,
) -> Result<()> {
    if !force && best_exists(repository) {
        anyhow::bail!(
            "{} already holds a model; pass --force to replace it",
            repository.best_dir().display()
        );
    }
    let model = NnModel::random(board.feature_len(), board.policy_len(), seed);
    repository.save_best(&model)?;
    log::info!("wrote initial model to {}", repository.best_dir().display());
    Ok(())
}

fn best_exists(repository: &NpyModelRepository) -> bool {
    repository.best_dir().join("policy_weight.npy").exists()
}

/// Create the first best model when the directory is empty
fn ensure_best_model(repository: &mut NpyModelRepository, board: &BoardConfig) -> Result<()> {
    if best_exists(repository) {
        return Ok(());
    }
    init(repository, board, 0, false)
}

fn selfplay(
    repository: &NpyModelRepository,
    board: &BoardConfig,
    config: &SelfPlayConfig,
    output: &Path,
) -> Result<()> {
    let model = repository.load_best()?;

    let mut examples = Vec::new();
    if config.threads > 1 {
        for record in play_games_parallel(&model, board, config)? {
            examples.extend(game_to_training_examples(&record));
        }
    } else {
        let stream = SelfPlayStream::new(&model, board.clone(), config.clone());
        for (game, result) in stream.enumerate() {
            let game_examples = result?;
            log::info!("game {}/{}: {} plies", game + 1, config.games, game_examples.len());
            examples.extend(game_examples);
        }
    }

    if examples.is_empty() {
        log::info!("no self-play examples, nothing written to {}", output.display());
        return Ok(());
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    save_training_data(&examples, output)?;
    log::info!("saved {} examples to {}_*.npy", examples.len(), output.display());
    Ok(())
}

fn play(
    repository: &NpyModelRepository,
    board: BoardConfig,
    mcts_config: MctsConfig,
    human: Player,
) -> Result<()> {
    let model = repository.load_best()?;
    let (rows, cols) = (board.rows, board.cols);
    let mut session = PlaySession::new(board, human)?;

    let (event_tx, event_rx) = unbounded::<Event>();
    let (search_tx, search_rx) = unbounded::<GameState>();

    // AI worker: one search per request, answered on the event queue
    let ai_events = event_tx.clone();
    thread::spawn(move || {
        let mut mcts = Mcts::from_config(&mcts_config);
        for state in search_rx.iter() {
            let event = match mcts.search(&state, &model, &mcts_config) {
                Ok(result) => Event::AiMoved(result.action),
                Err(e) => Event::AiFailed(e.to_string()),
            };
            mcts.reset();
            if ai_events.send(event).is_err() {
                break;
            }
        }
    });

    spawn_stdin_reader(event_tx, rows, cols);

    let mut effect = session.start();
    loop {
        match effect {
            Effect::Quit => break,
            Effect::Ignored => {}
            Effect::Redraw => draw(&session)?,
            Effect::RequestAiMove(state) => {
                draw(&session)?;
                search_tx.send(state).context("AI worker stopped")?;
            }
        }
        let event = event_rx.recv().context("event queue closed")?;
        effect = session.handle(event);
    }
    Ok(())
}

fn spawn_stdin_reader(events: Sender<Event>, rows: usize, cols: usize) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let input = match line {
                Ok(line) => Input::parse(&line, rows, cols),
                Err(_) => Input::Quit,
            };
            if events.send(Event::Human(input)).is_err() || input == Input::Quit {
                return;
            }
        }
        let _ = events.send(Event::Human(Input::Quit));
    });
}

fn draw(session: &PlaySession) -> Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", "-".repeat(20))?;
    write!(stdout, "{}", render(session.state()))?;
    let state = session.state();
    if session.phase() == Phase::Finished {
        let outcome = match state.winner() {
            Some(winner) if winner == session.human() => "you win",
            Some(_) => "AI wins",
            None if state.is_done() => "draw",
            None => "stopped",
        };
        writeln!(stdout, "game over: {}; enter anything to play again", outcome)?;
    } else if state.player_to_move() == session.human() {
        if state.is_pass() {
            writeln!(stdout, "no legal move, enter anything to pass")?;
        } else {
            writeln!(stdout, "your move (e.g. c4 or `row col`, q to quit):")?;
        }
    } else {
        writeln!(stdout, "AI is thinking...")?;
    }
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository_with_model(dir: &Path, board: &BoardConfig) -> NpyModelRepository {
        let mut repository = NpyModelRepository::new(dir.join("models"));
        init(&mut repository, board, 3, false).unwrap();
        repository
    }

    #[test]
    fn test_selfplay_without_examples_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let board = BoardConfig::new(4, 4);
        let repository = repository_with_model(dir.path(), &board);
        let output = dir.path().join("data").join("run");

        let config = SelfPlayConfig::default().with_games(0);
        selfplay(&repository, &board, &config, &output).unwrap();

        // A board where the opening is already final yields games without plies.
        let dead = BoardConfig::new(2, 2).with_opening(vec![0], vec![3]);
        let repository = repository_with_model(&dir.path().join("dead"), &dead);
        selfplay(&repository, &dead, &config.with_games(2), &output).unwrap();

        assert!(!dir.path().join("data").exists());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let board = BoardConfig::new(4, 4);
        let mut repository = repository_with_model(dir.path(), &board);

        assert!(init(&mut repository, &board, 4, false).is_err());
        assert!(init(&mut repository, &board, 4, true).is_ok());
    }
}
