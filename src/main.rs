use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use orderly::app::App;
use orderly::config::Config;
use orderly::session::round::{PuzzleRound, RoundStatus};

#[derive(Parser)]
#[command(name = "orderly", version, about = "Put the pictures in the right order")]
struct Cli {
    #[arg(short, long, help = "Config file (TOML)")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Progress save file")]
    save: Option<PathBuf>,

    #[arg(short, long, help = "Directory holding level images")]
    assets: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List levels with their lock state and best score
    Levels,
    /// Play a level in the terminal
    Play { level: u32 },
    /// Show the unlocked level, completed levels and last play time
    Status,
    /// Turn sounds on or off
    Sounds { state: Toggle },
    /// Reset all progress to the initial state
    Reset,
    /// Delete the progress file
    Delete,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Ignoring unreadable config: {e}");
            Config::default()
        }),
    };
    if let Some(save) = cli.save {
        config.save_file = save;
    }
    if let Some(assets) = cli.assets {
        config.asset_dir = assets;
    }

    let mut app = App::from_config(config);
    if app.store.recovered_from_corruption() {
        eprintln!(
            "Warning: {} could not be read; starting with fresh progress.",
            app.store.json_store().path().display()
        );
    }

    match cli.command {
        Command::Levels => print_levels(&app),
        Command::Play { level } => play(&mut app, level),
        Command::Status => print_status(&app),
        Command::Sounds { state } => {
            app.store.update_settings(matches!(state, Toggle::On))?;
            println!("Sounds {}", if app.sounds_enabled() { "on" } else { "off" });
            Ok(())
        }
        Command::Reset => {
            app.store.reset_progress()?;
            println!("Progress reset.");
            Ok(())
        }
        Command::Delete => {
            app.store.delete_progress()?;
            println!("Progress deleted.");
            Ok(())
        }
    }
}

fn print_levels(app: &App) -> Result<()> {
    for entry in app.level_menu()? {
        let state = match (entry.unlocked, entry.completed) {
            (false, _) => "locked",
            (true, true) => "done",
            (true, false) => "open",
        };
        if entry.best_score > 0 {
            println!("Level {:>3}  {state:<6}  best {}", entry.level, entry.best_score);
        } else {
            println!("Level {:>3}  {state:<6}", entry.level);
        }
    }
    Ok(())
}

fn print_status(app: &App) -> Result<()> {
    let store = &app.store;
    println!("Unlocked level:   {}", store.unlocked_level()?);
    println!("Completed levels: {:?}", store.completed_levels()?);
    println!(
        "Last played:      {}",
        store.last_played()?.unwrap_or("never")
    );
    println!(
        "Sounds:           {}",
        if store.settings()?.sounds { "on" } else { "off" }
    );
    Ok(())
}

fn play(app: &mut App, level: u32) -> Result<()> {
    let mut rng = SmallRng::from_entropy();
    let mut round = app.start_level(level, &mut rng, Utc::now())?;

    println!("Level {level}: enter the pictures in the right order, e.g. \"2 3 1\" (q to quit).");
    for (slot, &image) in round.display_order().iter().enumerate() {
        println!("  {}) {}", slot + 1, round.images()[image].label());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while !round.is_solved() {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            bail!("input closed before level {level} was solved");
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            println!("Level abandoned.");
            return Ok(());
        }

        match parse_slots(line, round.display_order().len()) {
            Some(slots) => submit(&mut round, &slots),
            None => println!(
                "Please enter {} distinct numbers between 1 and {}.",
                round.display_order().len(),
                round.display_order().len()
            ),
        }
    }

    match app.finish_round(&round) {
        Ok(score) => {
            let bell = if app.sounds_enabled() { "\x07" } else { "" };
            println!(
                "{bell}Well done! Solved in {:.1}s, score {score}.",
                round.elapsed_secs(Utc::now())
            );
            Ok(())
        }
        Err(e) => {
            error!("Could not save level {level}: {e}");
            Err(e.into())
        }
    }
}

fn submit(round: &mut PuzzleRound, slots: &[usize]) {
    round.reset();
    let images: Vec<usize> = slots.iter().map(|&slot| round.display_order()[slot]).collect();
    for image in images {
        match round.select(image, Utc::now()) {
            RoundStatus::WrongOrder => println!("That order is not right, try again."),
            RoundStatus::Solved | RoundStatus::Selecting { .. } | RoundStatus::Ignored => {}
        }
    }
}

/// Parse 1-based display slots separated by spaces or commas.
fn parse_slots(line: &str, count: usize) -> Option<Vec<usize>> {
    let slots: Vec<usize> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<usize>().ok().filter(|n| (1..=count).contains(n)))
        .collect::<Option<Vec<_>>>()?
        .into_iter()
        .map(|n| n - 1)
        .collect();

    let mut sorted = slots.clone();
    sorted.sort_unstable();
    sorted.dedup();
    (slots.len() == count && sorted.len() == count).then_some(slots)
}
