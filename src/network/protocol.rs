//! Protocol Messages
//!
//! Line-oriented JSON exchanged with bot clients. The transport itself
//! lives outside this crate; these types only cover the message shapes and
//! their conversion to and from the engine's types.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::warn;

use crate::core::position::{Direction, Position};
use crate::game::action::Action;
use crate::game::grid::{GridSnapshot, TeamId, Unit, UnitId, TEAM_COUNT};

/// Reply sent for a line that is not valid JSON.
pub const INVALID_JSON: &str = "Invalid JSON";

/// Protocol errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Line is not valid JSON or does not match any message shape.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// A MOVE action without a direction.
    #[error("unit {0} sent MOVE without a direction")]
    MissingDirection(UnitId),

    /// Team id outside the match.
    #[error("team {0} does not exist")]
    UnknownTeam(TeamId),
}

// =============================================================================
// ACTIONS
// =============================================================================

/// Action kind as spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WireActionType {
    /// Step in `direction`
    Move,
    /// Do nothing
    Pass,
}

/// One submitted action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAction {
    /// Acting unit. Older bots send `botId`.
    #[serde(rename = "unitId", alias = "botId")]
    pub unit_id: UnitId,
    /// MOVE or PASS
    #[serde(rename = "type")]
    pub action_type: WireActionType,
    /// Required for MOVE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl TryFrom<&WireAction> for Action {
    type Error = ProtocolError;

    fn try_from(wire: &WireAction) -> Result<Self, Self::Error> {
        match wire.action_type {
            WireActionType::Pass => Ok(Action::pass(wire.unit_id)),
            WireActionType::Move => wire
                .direction
                .map(|direction| Action::movement(wire.unit_id, direction))
                .ok_or(ProtocolError::MissingDirection(wire.unit_id)),
        }
    }
}

impl From<&Action> for WireAction {
    fn from(action: &Action) -> Self {
        Self {
            unit_id: action.unit_id,
            action_type: if action.is_pass() {
                WireActionType::Pass
            } else {
                WireActionType::Move
            },
            direction: action.direction(),
        }
    }
}

/// Convert a submitted batch, keeping submission order.
///
/// Actions that cannot be converted are dropped and returned separately;
/// the rest of the batch still resolves.
pub fn decode_actions(wire: &[WireAction]) -> (Vec<Action>, Vec<ProtocolError>) {
    let mut actions = Vec::with_capacity(wire.len());
    let mut rejected = Vec::new();

    for entry in wire {
        match Action::try_from(entry) {
            Ok(action) => actions.push(action),
            Err(e) => {
                warn!(error = %e, "dropping action");
                rejected.push(e);
            }
        }
    }

    (actions, rejected)
}

/// Parse a `player-turn` line into actions.
///
/// Any other message type is a [`ProtocolError::Json`].
pub fn decode_turn(line: &str) -> Result<(Vec<Action>, Vec<ProtocolError>), ProtocolError> {
    match ClientMessage::from_json(line)? {
        ClientMessage::PlayerTurn { actions } => Ok(decode_actions(&actions)),
        _ => Err(ProtocolError::Json(serde::de::Error::custom(
            "expected a player-turn message",
        ))),
    }
}

// =============================================================================
// STATE SNAPSHOT
// =============================================================================

/// Grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coords {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl From<Position> for Coords {
    fn from(pos: Position) -> Self {
        Self { x: pos.x, y: pos.y }
    }
}

impl From<Coords> for Position {
    fn from(coords: Coords) -> Self {
        Position::new(coords.x, coords.y)
    }
}

/// A barrel in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBarrel {
    /// Owning team
    pub team: TeamId,
    /// Current cell
    pub coords: Coords,
}

/// A dwarf in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireUnit {
    /// Unit id
    pub id: UnitId,
    /// Display name
    pub name: String,
    /// Owning team
    pub team: TeamId,
    /// Current cell
    pub coords: Coords,
}

impl From<&Unit> for WireUnit {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            name: unit.name.clone(),
            team: unit.team,
            coords: unit.position.into(),
        }
    }
}

/// Per-tick state sent to every client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    /// Barrels keyed by team id
    pub barrels: BTreeMap<String, WireBarrel>,
    /// Team 0 roster
    pub team0: Vec<WireUnit>,
    /// Team 1 roster
    pub team1: Vec<WireUnit>,
}

impl StateMessage {
    /// Barrel of `team`.
    pub fn barrel(&self, team: TeamId) -> Result<&WireBarrel, ProtocolError> {
        self.barrels
            .get(&team.to_string())
            .ok_or(ProtocolError::UnknownTeam(team))
    }

    /// Roster of `team`.
    pub fn units(&self, team: TeamId) -> Result<&[WireUnit], ProtocolError> {
        match team {
            0 => Ok(&self.team0),
            1 => Ok(&self.team1),
            _ => Err(ProtocolError::UnknownTeam(team)),
        }
    }
}

impl From<&GridSnapshot> for StateMessage {
    fn from(snapshot: &GridSnapshot) -> Self {
        let barrels = snapshot
            .objects
            .iter()
            .map(|(team, pos)| {
                (
                    team.to_string(),
                    WireBarrel {
                        team: *team,
                        coords: (*pos).into(),
                    },
                )
            })
            .collect();

        let roster = |team: TeamId| -> Vec<WireUnit> {
            snapshot
                .units_by_team
                .get(&team)
                .map(|units| units.iter().map(WireUnit::from).collect())
                .unwrap_or_default()
        };

        Self {
            barrels,
            team0: roster(0),
            team1: roster(1),
        }
    }
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Actions for the current tick.
    PlayerTurn {
        /// Ordered actions
        actions: Vec<WireAction>,
    },

    /// Join an existing simulation, or the next free one.
    JoinSimulation {
        /// Player nickname
        nick: String,
        /// Simulation to join
        #[serde(rename = "simulationId", default, skip_serializing_if = "Option::is_none")]
        simulation_id: Option<String>,
        /// Names for the player's dwarves
        #[serde(default)]
        names: Vec<String>,
    },

    /// Ask the server to open a new simulation.
    CreateSimulation,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// State after a tick.
    Turn {
        /// Snapshot
        state: StateMessage,
    },

    /// Sent once after joining.
    GameInfo {
        /// The player's team
        team: TeamId,
        /// Grid columns
        width: i32,
        /// Grid rows
        height: i32,
    },

    /// A simulation was created and can be joined.
    Ready {
        /// Simulation to join
        #[serde(rename = "simulationId")]
        simulation_id: String,
    },

    /// A team scored.
    Score {
        /// Scoring team
        team: TeamId,
    },

    /// Request could not be served.
    Error {
        /// Reason
        message: String,
    },
}

impl ServerMessage {
    /// Turn message for a snapshot.
    pub fn turn(snapshot: &GridSnapshot) -> Self {
        ServerMessage::Turn {
            state: StateMessage::from(snapshot),
        }
    }

    /// Game info for a player on `team`.
    pub fn game_info(team: TeamId, width: i32, height: i32) -> Result<Self, ProtocolError> {
        if team >= TEAM_COUNT {
            return Err(ProtocolError::UnknownTeam(team));
        }
        Ok(ServerMessage::GameInfo { team, width, height })
    }

    /// Reply to a line that did not parse.
    pub fn invalid_json() -> Self {
        ServerMessage::Error {
            message: INVALID_JSON.to_string(),
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Serialize as one newline-terminated line.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = self.to_json()?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::action::ActionKind;
    use crate::game::grid::{Grid, UnitSpawn};

    #[test]
    fn test_decode_turn_accepts_both_id_spellings() {
        let line = r#"{"type":"player-turn","actions":[
            {"botId":1,"type":"MOVE","direction":"NORTH"},
            {"unitId":2,"type":"PASS"}
        ]}"#;

        let (actions, rejected) = decode_turn(line).unwrap();
        assert!(rejected.is_empty());
        assert_eq!(
            actions,
            vec![Action::movement(1, Direction::North), Action::pass(2)]
        );
    }

    #[test]
    fn test_move_without_direction_is_dropped_alone() {
        let line = r#"{"type":"player-turn","actions":[
            {"unitId":1,"type":"MOVE"},
            {"unitId":2,"type":"MOVE","direction":"WEST"}
        ]}"#;

        let (actions, rejected) = decode_turn(line).unwrap();
        assert_eq!(actions, vec![Action::movement(2, Direction::West)]);
        assert_eq!(rejected.len(), 1);
        assert!(matches!(rejected[0], ProtocolError::MissingDirection(1)));
    }

    #[test]
    fn test_decode_turn_rejects_garbage() {
        assert!(matches!(decode_turn("{not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(
            decode_turn(r#"{"type":"create-simulation"}"#),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn test_wire_action_serializes_unit_id() {
        let wire = WireAction::from(&Action::movement(5, Direction::East));
        let json = serde_json::to_string(&wire).unwrap();
        assert_eq!(json, r#"{"unitId":5,"type":"MOVE","direction":"EAST"}"#);

        let pass = serde_json::to_string(&WireAction::from(&Action::pass(5))).unwrap();
        assert_eq!(pass, r#"{"unitId":5,"type":"PASS"}"#);

        let back = Action::try_from(&wire).unwrap();
        assert_eq!(back.kind, ActionKind::Move(Direction::East));
    }

    #[test]
    fn test_client_message_envelopes() {
        let join = ClientMessage::from_json(
            r#"{"type":"join-simulation","nick":"Drunk","simulationId":"abc","names":["Carawebo","Pantuflo"]}"#,
        )
        .unwrap();
        assert_eq!(
            join,
            ClientMessage::JoinSimulation {
                nick: "Drunk".to_string(),
                simulation_id: Some("abc".to_string()),
                names: vec!["Carawebo".to_string(), "Pantuflo".to_string()],
            }
        );

        let create = ClientMessage::from_json(r#"{"type":"create-simulation"}"#).unwrap();
        assert_eq!(create, ClientMessage::CreateSimulation);
        assert_eq!(create.to_json().unwrap(), r#"{"type":"create-simulation"}"#);
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let mut grid = Grid::new(21, 21).unwrap();
        grid.set_team(
            0,
            Position::new(8, 9),
            &[UnitSpawn::new(1, "Rhun Diamondfighter", Position::new(4, 18))],
        )
        .unwrap();
        grid.set_team(1, Position::new(11, 9), &[]).unwrap();

        let message = ServerMessage::turn(&grid.snapshot());
        let value: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();

        assert_eq!(value["type"], "turn");
        assert_eq!(value["state"]["barrels"]["0"]["coords"]["x"], 8);
        assert_eq!(value["state"]["barrels"]["1"]["team"], 1);
        assert_eq!(value["state"]["team0"][0]["name"], "Rhun Diamondfighter");
        assert_eq!(value["state"]["team0"][0]["coords"]["y"], 18);
        assert_eq!(value["state"]["team1"], serde_json::json!([]));
    }

    #[test]
    fn test_state_message_lookups() {
        let mut grid = Grid::new(5, 5).unwrap();
        grid.set_team(0, Position::new(0, 0), &[]).unwrap();
        grid.set_team(1, Position::new(4, 4), &[UnitSpawn::new(3, "c", Position::new(2, 2))])
            .unwrap();
        let state = StateMessage::from(&grid.snapshot());

        assert_eq!(state.barrel(1).unwrap().coords, Coords { x: 4, y: 4 });
        assert_eq!(state.units(1).unwrap()[0].id, 3);
        assert!(matches!(state.barrel(2), Err(ProtocolError::UnknownTeam(2))));
        assert!(matches!(state.units(7), Err(ProtocolError::UnknownTeam(7))));
    }

    #[test]
    fn test_server_messages() {
        assert_eq!(
            ServerMessage::invalid_json().to_line().unwrap(),
            "{\"type\":\"error\",\"message\":\"Invalid JSON\"}\n"
        );

        let info = ServerMessage::game_info(1, 21, 21).unwrap();
        assert_eq!(
            info.to_json().unwrap(),
            r#"{"type":"game-info","team":1,"width":21,"height":21}"#
        );
        assert!(matches!(
            ServerMessage::game_info(2, 21, 21),
            Err(ProtocolError::UnknownTeam(2))
        ));

        let ready = ServerMessage::Ready { simulation_id: "s1".to_string() };
        assert_eq!(ready.to_json().unwrap(), r#"{"type":"ready","simulationId":"s1"}"#);
        assert_eq!(ServerMessage::from_json(&ready.to_json().unwrap()).unwrap(), ready);
    }
}
