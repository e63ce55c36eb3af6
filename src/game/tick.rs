//! Turn Resolution Tick
//!
//! One tick resolves one batch of actions, strictly in submission order.
//! Each action's cascade completes before the next action starts, so the
//! outcome depends only on the starting state, the batch and the scatter
//! draws.

use tracing::debug;
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::rng::derive_match_seed;
use crate::game::action::{Action, ActionKind};
use crate::game::events::{ResolutionEvent, ResolutionEventData, SkipReason};
use crate::game::grid::UnitId;
use crate::game::resolve::Resolver;
use crate::game::scatter::ScatterSource;
use crate::game::state::MatchState;
use crate::{DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH};

/// Default cap on nested pushes and scatters within one action.
pub const DEFAULT_MAX_CASCADE_DEPTH: u32 = 64;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<ResolutionEvent>,
}

impl TickResult {
    /// Number of cells that changed hands this tick.
    pub fn displacement_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_displacement()).count()
    }
}

/// Configuration for match simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchConfig {
    /// Grid columns
    pub width: i32,
    /// Grid rows
    pub height: i32,
    /// Fixed RNG seed. When unset the seed is derived from the match id and
    /// the registered unit ids.
    pub rng_seed: Option<u64>,
    /// Deepest cascade level resolved before a step is blocked
    pub max_cascade_depth: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            rng_seed: None,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
        }
    }
}

impl MatchConfig {
    /// Load from environment variables, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            width: env_parse("TAVERN_GRID_WIDTH").unwrap_or(defaults.width),
            height: env_parse("TAVERN_GRID_HEIGHT").unwrap_or(defaults.height),
            rng_seed: env_parse("TAVERN_RNG_SEED"),
            max_cascade_depth: env_parse("TAVERN_MAX_CASCADE_DEPTH")
                .unwrap_or(defaults.max_cascade_depth),
        }
    }

    /// Seed for a match: the configured one, or one derived from the match
    /// id and roster.
    pub fn seed_for(&self, match_id: &[u8; 16], unit_ids: &[UnitId]) -> u64 {
        self.rng_seed
            .unwrap_or_else(|| derive_match_seed(match_id, unit_ids))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Run one tick, drawing scatter outcomes from the match RNG.
pub fn tick(state: &mut MatchState, actions: &[Action], config: &MatchConfig) -> TickResult {
    let mut rng = state.rng.clone();
    let result = tick_with(state, actions, config, &mut rng);
    state.rng = rng;
    result
}

/// Run one tick with an explicit scatter source.
///
/// The match RNG is left untouched.
pub fn tick_with(
    state: &mut MatchState,
    actions: &[Action],
    config: &MatchConfig,
    source: &mut dyn ScatterSource,
) -> TickResult {
    state.tick += 1;
    let tick = state.tick;

    for (index, action) in actions.iter().enumerate() {
        let direction = match action.kind {
            ActionKind::Pass => continue,
            ActionKind::Move(direction) => direction,
        };

        if state.grid.unit(action.unit_id).is_none() {
            debug!(tick, unit_id = action.unit_id, "skipping action for unknown unit");
            state.push_event(ResolutionEvent::new(
                tick,
                index,
                ResolutionEventData::ActionSkipped {
                    unit_id: action.unit_id,
                    reason: SkipReason::UnknownUnit,
                },
            ));
            continue;
        }

        let mut resolver = Resolver::new(&mut state.grid, &mut *source, config.max_cascade_depth);
        let moved = resolver.resolve_unit_move(action.unit_id, direction);
        let events = resolver.into_events();

        debug!(
            tick,
            unit_id = action.unit_id,
            %direction,
            moved,
            events = events.len(),
            "resolved action"
        );

        for data in events {
            state.push_event(ResolutionEvent::new(tick, index, data));
        }

        debug_assert!(
            state.grid.check_invariants().is_ok(),
            "occupancy broken after action {} of tick {}",
            index,
            tick
        );

        #[cfg(feature = "debug-tracing")]
        trace!(tick, index, "grid after action\n{}", state.grid.render());
    }

    TickResult {
        events: state.take_events(),
    }
}

/// Replay a match from recorded action batches.
///
/// Returns the final state and every event, in order.
pub fn replay_ticks(
    initial_state: &MatchState,
    batches: &[Vec<Action>],
    config: &MatchConfig,
) -> (MatchState, Vec<ResolutionEvent>) {
    let mut state = initial_state.clone();
    let mut all_events = Vec::new();

    for batch in batches {
        let result = tick(&mut state, batch, config);
        all_events.extend(result.events);
    }

    (state, all_events)
}
