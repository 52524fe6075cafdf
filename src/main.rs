//! CLI entry point for cloister
//!
//! Plays a game headless in the terminal.

use cloister::GameConfig;
use log::error;
use std::path::PathBuf;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("CLOISTER_LOG", "info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    match command.as_str() {
        "play" => {
            let config_path = args.get(2).map(PathBuf::from);
            if let Err(err) = run_play(config_path) {
                error!("{err:#}");
                eprintln!("Error: Player mode failed");
                eprintln!("Reason: {err:#}");
                process::exit(1);
            }
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Error: Unknown command '{}'", command);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("cloister - Visual Novel Dialogue Engine");
    println!();
    println!("USAGE:");
    println!("    cargo run -- play [game.json]");
    println!();
    println!("COMMANDS:");
    println!("    play [file]     Play the game in the terminal");
    println!("    --help, -h      Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    CLOISTER_LOG           Log filter (default: info)");
    println!("    CLOISTER_LOCALE        Override assets.locale");
    println!("    CLOISTER_ENTRY_NODE    Override dialogue.entry_node");
    println!();
    println!("Without a config file, assets are read from ./gamedata.");
}

fn run_play(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    config.apply_env();
    cloister::cli::play::run_play(config)
}
