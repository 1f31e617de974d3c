pub mod scenario;
pub mod terminal;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;
use log::{info, warn};

use crate::config::{RideConfig, RideContent};
use crate::dialogue::markup;
use crate::results::{extract_words, ResultsBoard, SlotGroup, WordBank, WordEntry};
use crate::ride::{Collaborators, Ride};
use crate::stats::RoundSummary;
use crate::traffic::TrafficPhase;
use terminal::{Speaker, TerminalActor, TerminalPrompts, TerminalScreens, TerminalSounds, TerminalView};

/// Longest stretch of simulated time one catch-up may cover.
const MAX_CATCH_UP: f32 = 120.0;

const WORD_BANK_STREAM: u64 = 2;

// ---------------------------------------------------------------------------
// Player commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Go,
    Stop,
    /// One-based, as printed.
    Answer(usize),
    Clue(String),
    /// Extra seconds to let pass on top of the typing time.
    Wait(f32),
    Quit,
    Unknown,
}

fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Command::Wait(0.0);
    };
    match head.to_lowercase().as_str() {
        "go" | "g" | "drive" => Command::Go,
        "stop" | "s" | "brake" => Command::Stop,
        "clue" | "c" => match parts.next() {
            Some(id) => Command::Clue(id.to_string()),
            None => Command::Unknown,
        },
        "wait" | "w" => Command::Wait(parts.next().and_then(|s| s.parse().ok()).unwrap_or(0.0)),
        "quit" | "exit" | "q" => Command::Quit,
        other => match other.parse() {
            Ok(n) if n > 0 => Command::Answer(n),
            _ => Command::Unknown,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BoardCommand {
    Place(SlotGroup, usize, String),
    Clear(SlotGroup, usize),
    ClearAll,
    Check,
    Quit,
    Unknown,
}

/// `p1`, `t2`: group letter plus one-based slot number.
fn parse_slot(label: &str) -> Option<(SlotGroup, usize)> {
    let label = label.to_lowercase();
    let (group, number) = label.split_at(label.find(|c: char| c.is_ascii_digit())?);
    let group = match group {
        "p" => SlotGroup::Profession,
        "t" => SlotGroup::Text,
        _ => return None,
    };
    let number: usize = number.parse().ok()?;
    Some((group, number.checked_sub(1)?))
}

fn parse_board_command(line: &str) -> BoardCommand {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["check"] => BoardCommand::Check,
        ["clear"] => BoardCommand::ClearAll,
        ["clear", slot] => match parse_slot(slot) {
            Some((group, index)) => BoardCommand::Clear(group, index),
            None => BoardCommand::Unknown,
        },
        ["quit" | "exit" | "q"] => BoardCommand::Quit,
        [slot, word] => match (parse_slot(slot), word.parse::<usize>()) {
            (None, _) | (_, Ok(0)) => BoardCommand::Unknown,
            (Some((group, index)), _) => BoardCommand::Place(group, index, word.to_string()),
        },
        _ => BoardCommand::Unknown,
    }
}

/// A word by its one-based number on the board, or by id or title.
fn pick_word<'a>(bank: &'a WordBank, word: &str) -> Option<&'a WordEntry> {
    match word.parse::<usize>() {
        Ok(n) => bank.words().get(n.checked_sub(1)?),
        Err(_) => bank.find(word),
    }
}

fn read_line() -> Result<Option<String>> {
    print!("\n> ");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

// ---------------------------------------------------------------------------
// The drive
// ---------------------------------------------------------------------------

enum RideOutcome {
    Finished,
    Quit,
}

/// The ride cannot move on without the player.
fn needs_player(ride: &Ride) -> bool {
    if ride.is_finished() {
        return true;
    }
    match ride.traffic_phase() {
        TrafficPhase::WaitingForBrake | TrafficPhase::WaitingForGo => return true,
        TrafficPhase::WaitingForStop => return false,
        TrafficPhase::None => {}
    }
    if ride.state().awaits_player() {
        return true;
    }
    ride.presenter().is_some_and(|p| {
        !p.current_answers().is_empty()
            || p.displayed_text().is_some_and(|t| !markup::extract_links(t).is_empty())
    })
}

fn advance(ride: &mut Ride, seconds: f32, step: f32) {
    let mut left = seconds.clamp(0.0, MAX_CATCH_UP);
    while left > 0.0 {
        let dt = left.min(step);
        ride.tick(dt);
        left -= dt;
    }
}

/// Skip ahead until the player has something to do.
fn fast_forward(ride: &mut Ride, step: f32) {
    let mut spent = 0.0;
    while !needs_player(ride) {
        if spent >= MAX_CATCH_UP {
            warn!("Ride is not asking for input after {spent:.0}s, handing control back");
            return;
        }
        ride.tick(step);
        spent += step;
    }
}

fn play_ride(ride: &mut Ride, step: f32) -> Result<RideOutcome> {
    ride.begin();
    info!("Ride started with {} passenger(s)", ride.sequence().len());

    loop {
        fast_forward(ride, step);
        if ride.is_finished() {
            return Ok(RideOutcome::Finished);
        }

        let typing = Instant::now();
        let Some(input) = read_line()? else {
            return Ok(RideOutcome::Quit);
        };
        let command = parse_command(&input);
        info!("Player input: \"{input}\" -> {command:?}");

        // Clues are read off the text that was on screen while typing.
        if let Command::Clue(id) = &command {
            if ride.collect_clue(id) {
                println!("(Noted: {id})");
            } else {
                println!("(No clue '{id}' on screen.)");
            }
        }
        // Time passed while the player was typing; red lights do not wait.
        advance(ride, typing.elapsed().as_secs_f32(), step);

        match command {
            Command::Go => ride.request_start(),
            Command::Stop => ride.request_stop(),
            Command::Answer(n) => {
                if !ride.select_answer(n - 1) {
                    println!("(No answer {n} right now.)");
                }
            }
            Command::Clue(_) => {}
            Command::Wait(extra) => advance(ride, extra, step),
            Command::Quit => return Ok(RideOutcome::Quit),
            Command::Unknown => {
                println!("(Commands: go, stop, <answer number>, clue <id>, wait [seconds], quit)")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Results board
// ---------------------------------------------------------------------------

fn show_board(board: &ResultsBoard, bank: &WordBank) {
    println!("\n----------------------------------------");
    println!("  Words:");
    for (i, word) in bank.words().iter().enumerate() {
        println!("    {:>2}. {} ({:?})", i + 1, word.title, word.kind);
    }
    for (group, label, letter) in [
        (SlotGroup::Profession, "Professions", 'p'),
        (SlotGroup::Text, "Places", 't'),
    ] {
        println!("  {label}:");
        for i in 0..board.slot_count(group) {
            let title = board.slot(group, i).map_or("___", |w| w.title.as_str());
            println!("    {letter}{} [{title}]", i + 1);
        }
    }
    println!("----------------------------------------");
    println!("  <slot> <word>  place a word (e.g. p1 3)");
    println!("  clear [slot]   empty one or every slot");
    println!("  check          submit, quit to give up");
}

/// Returns `true` once the board is solved, `false` if the player gave up.
fn play_results(content: &RideContent, config: &RideConfig) -> Result<bool> {
    let words = extract_words(&content.sequence, &content.results.words);
    let bank = WordBank::build(&words, &mut config.rng(WORD_BANK_STREAM));
    let mut board = ResultsBoard::new(&content.results);

    if board.slot_count(SlotGroup::Profession) + board.slot_count(SlotGroup::Text) == 0 {
        info!("No results board authored, skipping");
        return Ok(true);
    }

    println!("\n========================================");
    println!("   WHO WERE THEY?");
    println!("========================================");
    show_board(&board, &bank);

    loop {
        let Some(input) = read_line()? else {
            return Ok(false);
        };
        match parse_board_command(&input.to_lowercase()) {
            BoardCommand::Place(group, index, word) => match pick_word(&bank, &word) {
                Some(entry) if board.place(group, index, entry.clone()) => show_board(&board, &bank),
                _ => println!("(No such slot or word.)"),
            },
            BoardCommand::Clear(group, index) => {
                board.clear(group, index);
                show_board(&board, &bank);
            }
            BoardCommand::ClearAll => {
                board.clear_all();
                show_board(&board, &bank);
            }
            BoardCommand::Check => {
                if !board.is_complete() {
                    println!("(Fill every slot first.)");
                    continue;
                }
                if board.check_all() {
                    info!("Results board solved");
                    return Ok(true);
                }
                let marks = |group| -> String {
                    board
                        .correctness(group)
                        .iter()
                        .map(|ok| if *ok { "ok" } else { "x" })
                        .collect::<Vec<_>>()
                        .join(" ")
                };
                println!(
                    "(Not quite. Professions: {} | Places: {})",
                    marks(SlotGroup::Profession),
                    marks(SlotGroup::Text)
                );
            }
            BoardCommand::Quit => return Ok(false),
            BoardCommand::Unknown => println!("(Try 'p1 3', 't1 clinic', 'clear p1', 'check' or 'quit'.)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Game over screen
// ---------------------------------------------------------------------------

fn show_game_over(solved: Option<bool>, summary: &RoundSummary) {
    println!("\n========================================");
    println!("             END OF SHIFT");
    println!("========================================");
    match solved {
        Some(true) => println!("  Result: You remembered every passenger."),
        Some(false) => println!("  Result: The faces are already blurring."),
        None => println!("  You parked the cab early."),
    }
    println!("{summary}");
    println!("========================================\n");
    println!("  [r] Restart    [q] Quit\n");
}

/// Read the player's post-game choice. Returns `true` to restart, `false` to quit.
fn prompt_restart() -> Result<bool> {
    loop {
        let Some(input) = read_line()? else {
            return Ok(false);
        };
        match input.to_lowercase().as_str() {
            "r" => return Ok(true),
            "q" => return Ok(false),
            _ => println!("  Press [r] to restart or [q] to quit."),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry point: shifts in a loop until the player quits
// ---------------------------------------------------------------------------

pub fn run(config: RideConfig, content: RideContent) -> Result<()> {
    let step = config.tick_interval();

    loop {
        println!("\n========================================");
        println!("   NIGHT FARE");
        println!("========================================");
        println!("Drive your passengers, listen closely,");
        println!("and stop for red lights.\n");

        let speaker: Speaker = Rc::new(RefCell::new(String::new()));
        let collaborators = Collaborators {
            actor: Box::new(TerminalActor {
                speaker: speaker.clone(),
            }),
            prompts: Box::new(TerminalPrompts),
            sounds: Box::new(TerminalSounds),
            screens: Box::new(TerminalScreens),
            view: Some(Box::new(TerminalView { speaker })),
        };
        let mut ride = Ride::new(&config, content.sequence.clone(), collaborators);

        let solved = match play_ride(&mut ride, step)? {
            RideOutcome::Finished => Some(play_results(&content, &config)?),
            RideOutcome::Quit => None,
        };
        show_game_over(solved, &ride.summary());

        if !prompt_restart()? {
            println!("Thanks for driving!");
            break;
        }

        info!("Player chose to restart");
    }

    Ok(())
}
