// Auction draft entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load the player catalog
// 4. Assemble participants and the engine
// 5. Create mpsc channels
// 6. Spawn the stdin command reader task
// 7. Spawn the event printer task
// 8. Run the auction to completion
// 9. Print final standings and clean up

use courtcap::auction::engine::{build_participants, AuctionEngine};
use courtcap::catalog::PlayerCatalog;
use courtcap::config;
use courtcap::protocol::{AuctionEvent, Submission, SubmissionAction};
use courtcap::ranking::Standing;

use anyhow::Context;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not the terminal, which shows the
    //    auction itself)
    init_tracing()?;
    info!("courtcap starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} participants, ${} budget, {} roster slots",
        config.league_name,
        config.participants.len(),
        config.settings.budget,
        config.settings.roster_size
    );

    // 3. Load the player catalog
    let catalog = PlayerCatalog::load(std::path::Path::new(&config.catalog_path))
        .context("failed to load player catalog")?;
    info!("Loaded {} players from {}", catalog.len(), config.catalog_path);

    // 4. Assemble participants; seed from config for a reproducible auction,
    //    from entropy otherwise
    let participants = build_participants(
        &config.participants,
        config.settings.budget,
        config.settings.roster_size,
    );
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(seed, "engine seed");

    // 5. Create mpsc channels
    let (submission_tx, submission_rx) = mpsc::channel(64);
    let (event_tx, event_rx) = mpsc::channel(256);

    let engine = AuctionEngine::new(
        config.settings,
        config.valuation,
        catalog,
        participants,
        seed,
        submission_rx,
        event_tx,
    );

    // 6. Spawn the stdin command reader task. Commands:
    //      <participant#> nom <player_id>
    //      <participant#> bid <amount>
    //    with 1-based participant numbers matching the printed league order.
    let participant_count = config.participants.len();
    println!("{} is on. Commands: `<n> nom <player_id>`, `<n> bid <amount>`", config.league_name);
    for (i, p) in config.participants.iter().enumerate() {
        let kind = if p.automated { "auto" } else { "human" };
        println!("  {}. {} ({kind})", i + 1, p.name);
    }
    let stdin_handle = tokio::spawn(read_commands(submission_tx, participant_count));

    // 7. Spawn the event printer task
    let printer_handle = tokio::spawn(print_events(event_rx));

    // 8. Run the auction to completion
    let final_standings = engine.run().await.context("auction failed")?;

    // 9. Print final standings and clean up
    stdin_handle.abort();
    let _ = printer_handle.await;
    print_standings("Final standings", &final_standings);

    info!("courtcap shut down cleanly");
    Ok(())
}

// ---------------------------------------------------------------------------
// Stdin command reader
// ---------------------------------------------------------------------------

/// Read human commands from stdin until it closes, forwarding well-formed
/// ones to the engine. Malformed lines are reported and skipped; whether a
/// submission is timely/legal is the engine's call, not ours.
async fn read_commands(tx: mpsc::Sender<Submission>, participant_count: usize) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_command(&line, participant_count) {
            Some(submission) => {
                debug!(?submission, "forwarding submission");
                if tx.send(submission).await.is_err() {
                    // Engine is gone; the auction is over.
                    return;
                }
            }
            None => {
                if !line.trim().is_empty() {
                    warn!(line, "ignoring malformed command");
                    println!("?? unrecognized command: {line}");
                }
            }
        }
    }
}

/// Parse one command line into a submission. Returns `None` for anything
/// that isn't `<n> nom <id>` or `<n> bid <amount>` with a valid 1-based
/// participant number.
fn parse_command(line: &str, participant_count: usize) -> Option<Submission> {
    let mut parts = line.split_whitespace();
    let number: usize = parts.next()?.parse().ok()?;
    if number == 0 || number > participant_count {
        return None;
    }
    let participant = number - 1;

    let action = match (parts.next()?, parts.next()?) {
        ("nom", id) => SubmissionAction::Nominate(id.to_string()),
        ("bid", amount) => SubmissionAction::Bid(amount.parse().ok()?),
        _ => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(Submission {
        participant,
        action,
    })
}

// ---------------------------------------------------------------------------
// Event printer
// ---------------------------------------------------------------------------

/// Print engine events until the event channel closes.
async fn print_events(mut rx: mpsc::Receiver<AuctionEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            AuctionEvent::RoundStarted { round } => {
                println!("\n=== Round {round} ===");
            }
            AuctionEvent::NominationOpen { round: _, nominator } => {
                println!("{nominator} is on the clock to nominate");
            }
            AuctionEvent::PlayerNominated { player, nominated_by } => {
                println!(
                    "{nominated_by} nominates {} ({}, {:.1} ppg) -- bidding open",
                    player.name, player.position, player.ppg
                );
            }
            AuctionEvent::BidUpdated { participant, amount } => {
                println!("  {participant} bids ${amount}");
            }
            AuctionEvent::NominationResolved { winner, player, amount } => {
                println!("  SOLD: {} to {winner} for ${amount}", player.name);
            }
            AuctionEvent::StandingsUpdated(table) => {
                print_standings("Standings", &table);
            }
            AuctionEvent::AuctionComplete(_) => {
                println!("\nAuction complete. Every roster is full.");
            }
        }
    }
}

fn print_standings(title: &str, table: &[Standing]) {
    println!("{title}:");
    for row in table {
        println!("  {}. {} -- {} pts", row.rank, row.name, row.points);
    }
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize tracing to log to a file (the terminal carries the auction).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("courtcap.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courtcap=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
