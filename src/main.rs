//! Dwarven Tavern Server
//!
//! Runs a demo match on the standard board and checks that replaying it
//! gives the same state hash.

use anyhow::{ensure, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dwarven_tavern::{
    VERSION,
    core::position::{Direction, Position},
    game::{
        action::Action,
        events::ResolutionEventData,
        grid::{TeamId, UnitSpawn},
        state::MatchState,
        tick::{tick, replay_ticks, MatchConfig},
    },
    network::protocol::{decode_turn, ServerMessage},
};

/// Opening turn as a bot would send it.
const OPENING_TURN: &str = r#"{"type":"player-turn","actions":[
    {"botId":1,"type":"MOVE","direction":"NORTH"},
    {"botId":2,"type":"MOVE","direction":"EAST"},
    {"botId":3,"type":"MOVE","direction":"WEST"},
    {"botId":4,"type":"MOVE","direction":"SOUTH"},
    {"botId":5,"type":"MOVE","direction":"NORTH"},
    {"botId":6,"type":"MOVE","direction":"SOUTH"},
    {"botId":7,"type":"MOVE","direction":"EAST"},
    {"botId":8,"type":"MOVE","direction":"WEST"},
    {"botId":9,"type":"MOVE","direction":"NORTH"},
    {"botId":10,"type":"MOVE","direction":"SOUTH"},
    {"botId":98,"type":"MOVE","direction":"SOUTH"}
]}"#;

/// Random ticks played after the opening.
const DEMO_TICKS: u32 = 20;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Dwarven Tavern Server v{}", VERSION);

    let config = MatchConfig::from_env();
    info!(
        width = config.width,
        height = config.height,
        max_cascade_depth = config.max_cascade_depth,
        "Loaded match config"
    );

    demo_match(&config)
}

/// Team rosters: barrel position and (id, name, position) per dwarf.
fn rosters() -> Vec<(TeamId, Position, Vec<UnitSpawn>)> {
    let team0 = vec![
        UnitSpawn::new(1, "Rhun Diamondfighter", Position::new(4, 18)),
        UnitSpawn::new(2, "Balgairen Marble-Flame", Position::new(7, 18)),
        UnitSpawn::new(3, "Tavio Bluefeldspar", Position::new(10, 18)),
        UnitSpawn::new(4, "Caith Scarletjasper", Position::new(13, 18)),
        UnitSpawn::new(5, "Riagan Rubygold", Position::new(16, 18)),
    ];
    let team1 = vec![
        UnitSpawn::new(6, "Keenon Bismuth-Fulvous", Position::new(4, 2)),
        UnitSpawn::new(7, "Edmyg Earthyagate", Position::new(7, 2)),
        UnitSpawn::new(8, "Brady Metaldwarf", Position::new(10, 2)),
        UnitSpawn::new(9, "Tadd Talchief", Position::new(13, 2)),
        UnitSpawn::new(10, "Ceithin Feldspardigger", Position::new(16, 2)),
        UnitSpawn::new(98, "Fulanito de tal", Position::new(8, 8)),
        UnitSpawn::new(99, "Fulanito de tal II", Position::new(8, 10)),
    ];

    vec![
        (0, Position::new(8, 9), team0),
        (1, Position::new(11, 9), team1),
    ]
}

fn setup_match(match_id: [u8; 16], config: &MatchConfig) -> Result<MatchState> {
    let teams = rosters();

    let mut unit_ids: Vec<u32> = teams
        .iter()
        .flat_map(|(_, _, roster)| roster.iter().map(|spawn| spawn.id))
        .collect();
    unit_ids.sort_unstable();
    let seed = config.seed_for(&match_id, &unit_ids);

    let mut state = MatchState::new(match_id, seed, config.width, config.height)
        .context("invalid grid dimensions")?;
    for (team, barrel, roster) in &teams {
        state
            .set_team(*team, *barrel, roster)
            .with_context(|| format!("failed to place team {}", team))?;
    }
    Ok(state)
}

/// Demo function to test the simulation.
fn demo_match(config: &MatchConfig) -> Result<()> {
    info!("=== Starting Demo Match ===");

    let match_id = [1u8; 16];
    let initial = setup_match(match_id, config)?;

    info!("Match ID: {}", hex::encode(match_id));
    info!("RNG Seed: {}", initial.rng_seed);
    println!("{}", initial.grid);

    // Opening turn arrives as JSON, the rest is random walking
    let (opening, rejected) = decode_turn(OPENING_TURN)?;
    for e in &rejected {
        warn!(error = %e, "opening turn action rejected");
    }

    let mut batches = vec![opening];
    let mut walker = initial.rng.clone();
    let unit_ids: Vec<u32> = initial.grid.units().map(|unit| unit.id).collect();
    for _ in 0..DEMO_TICKS {
        let batch = unit_ids
            .iter()
            .map(|&id| match walker.choose(&Direction::ALL) {
                Some(direction) => Action::movement(id, *direction),
                None => Action::pass(id),
            })
            .collect();
        batches.push(batch);
    }

    let mut state = initial.clone();
    let mut total_events = 0;
    for batch in &batches {
        let result = tick(&mut state, batch, config);
        total_events += result.events.len();

        for event in &result.events {
            match &event.data {
                ResolutionEventData::ObjectPushed { team, from, to, .. } => {
                    info!("Tick {}: barrel {} pushed {} -> {}", event.tick, team, from, to);
                }
                ResolutionEventData::UnitScattered { unit_id, from, to, outcome } => {
                    info!(
                        "Tick {}: dwarf {} scattered {} -> {} ({:?})",
                        event.tick, unit_id, from, to, outcome
                    );
                }
                ResolutionEventData::CascadeLimitReached { depth } => {
                    warn!("Tick {}: cascade cut at depth {}", event.tick, depth);
                }
                _ => {}
            }
        }

        if state.tick == 1 {
            println!("{}", state.grid);
        }
    }

    // Print final results
    info!("=== Match Results ===");
    println!("{}", state.grid);
    println!("{}", ServerMessage::turn(&state.snapshot()).to_json()?);

    let hash = state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Total events: {}", total_events);

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let (replay_final, _) = replay_ticks(&initial, &batches, config);
    let replay_hash = replay_final.compute_hash();

    info!("Replay State Hash: {}", hex::encode(replay_hash));
    ensure!(hash == replay_hash, "determinism failure: replay hash differs");
    info!("DETERMINISM VERIFIED: Hashes match!");

    Ok(())
}
