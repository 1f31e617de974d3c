mod config;
mod context;
mod dialogue;
mod game;
mod results;
mod ride;
mod round;
mod stats;
#[cfg(test)]
mod testing;
mod timer;
mod traffic;
mod vehicle;

use anyhow::{Context, Result};
use config::{RideConfig, RideContent};

const USAGE: &str = "Usage: nightfare [content.json|-] [config.json]\n\
     \n\
     Without a content file (or with '-') the built-in night shift is played.\n\
     \n\
     Example:\n  nightfare ./rides/downtown.json ./rides/fast.json\n\
     \n\
     Logging: set RUST_LOG=debug or RUST_LOG=trace for verbose output";

fn main() -> Result<()> {
    // Initialize logging. Control verbosity with RUST_LOG env var:
    //   RUST_LOG=info   cargo run    # round transitions + player input
    //   RUST_LOG=debug  cargo run    # + dialogue nodes, lights, routing
    //   RUST_LOG=trace  cargo run    # + cab position every tick
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return Ok(());
    }

    let content = match args.get(1).map(String::as_str) {
        None | Some("-") => game::scenario::night_shift_scenario(),
        Some(path) => RideContent::load(path).context(USAGE)?,
    };

    let config = match args.get(2) {
        Some(path) => RideConfig::load(path).context("failed to load ride config")?,
        None => RideConfig::default(),
    };

    println!("Passengers : {}", content.sequence.len());
    println!("Tick rate  : {} Hz", config.tick_rate);
    match config.seed {
        Some(seed) => println!("Seed       : {seed}"),
        None => println!("Seed       : random"),
    }

    game::run(config, content)
}
