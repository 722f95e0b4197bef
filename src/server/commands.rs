//! Command decoding and dispatch.
//!
//! The wire carries one JSON object per line with exactly one top-level key
//! naming the command. Decoding produces an explicit [`Command`] enum, so
//! dispatch is a fixed match rather than a string-keyed lookup, and unknown
//! names or malformed parameters are rejected before any state is touched.

use log::debug;
use rand::Rng;
use serde_json::{json, Value};

use crate::config::GameConfig;
use crate::world::coordinates::Direction;
use crate::world::errors::WorldError;
use crate::world::universe::Universe;

use super::session::Session;
use super::snapshot;

/// One decoded client command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Register { name: String, password: String },
    Login { name: String, password: String },
    JoinGame { ship_name: String },
    Move { direction: Direction },
    Dock { id: String },
    Undock,
    Buy { item: String, quantity: u32 },
    Sell { item: String, quantity: u32 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Register { .. } => "register",
            Command::Login { .. } => "login",
            Command::JoinGame { .. } => "join_game",
            Command::Move { .. } => "move",
            Command::Dock { .. } => "dock",
            Command::Undock => "undock",
            Command::Buy { .. } => "buy",
            Command::Sell { .. } => "sell",
        }
    }

    /// Decode a single wire line into a command.
    pub fn parse(line: &str) -> Result<Command, WorldError> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| WorldError::validation(format!("malformed JSON: {e}")))?;
        let object = value
            .as_object()
            .ok_or_else(|| WorldError::validation("expected a JSON object"))?;
        if object.len() != 1 {
            return Err(WorldError::validation(
                "expected exactly one top-level command key",
            ));
        }
        // Exactly one entry; destructure it.
        let (name, params) = match object.iter().next() {
            Some((key, value)) => (key.as_str(), value),
            None => return Err(WorldError::validation("empty command object")),
        };

        match name {
            "register" => Ok(Command::Register {
                name: str_param(params, "name")?,
                password: str_param(params, "password")?,
            }),
            "login" => Ok(Command::Login {
                name: str_param(params, "name")?,
                password: str_param(params, "password")?,
            }),
            "join_game" => Ok(Command::JoinGame {
                ship_name: str_param(params, "ship_name").unwrap_or_default(),
            }),
            "move" => {
                let direction = str_param(params, "direction")?;
                direction
                    .parse::<Direction>()
                    .map(|direction| Command::Move { direction })
                    .map_err(|_| {
                        WorldError::validation(format!("unknown direction '{direction}'"))
                    })
            }
            "dock" => Ok(Command::Dock {
                id: str_param(params, "id")?,
            }),
            "undock" => Ok(Command::Undock),
            "buy" => Ok(Command::Buy {
                item: str_param(params, "item")?,
                quantity: quantity_param(params)?,
            }),
            "sell" => Ok(Command::Sell {
                item: str_param(params, "item")?,
                quantity: quantity_param(params)?,
            }),
            other => Err(WorldError::validation(format!("unknown command '{other}'"))),
        }
    }
}

fn str_param(params: &Value, key: &str) -> Result<String, WorldError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WorldError::validation(format!("missing parameter '{key}'")))
}

/// Quantities must be positive integers; floats, strings, zero and negatives
/// are all rejected here, before any pricing happens.
fn quantity_param(params: &Value) -> Result<u32, WorldError> {
    let value = params
        .get("quantity")
        .ok_or_else(|| WorldError::validation("missing parameter 'quantity'"))?;
    let quantity = value
        .as_u64()
        .ok_or_else(|| WorldError::validation("quantity must be a positive integer"))?;
    if quantity == 0 || quantity > u32::MAX as u64 {
        return Err(WorldError::validation("quantity must be a positive integer"));
    }
    Ok(quantity as u32)
}

/// Applies decoded commands to the world and renders snapshots.
pub struct CommandProcessor;

impl CommandProcessor {
    pub fn new() -> Self {
        CommandProcessor
    }

    /// Handle one wire line: decode, apply, snapshot.
    ///
    /// Errors never escape: a failed command leaves the world untouched and
    /// the unchanged snapshot goes back with the error text attached.
    pub fn process(
        &self,
        session: &mut Session,
        line: &str,
        universe: &mut Universe,
        config: &GameConfig,
        rng: &mut impl Rng,
    ) -> Value {
        session.update_activity();

        let outcome = Command::parse(line)
            .and_then(|command| self.apply(session, command, universe, config, rng));

        let mut payload = snapshot::snapshot(session, universe);
        if let Err(error) = outcome {
            debug!(
                "session {} ({}): command rejected: {}",
                session.id,
                session.display_name(),
                error
            );
            payload["error"] = json!(error.to_string());
        }
        payload
    }

    fn apply(
        &self,
        session: &mut Session,
        command: Command,
        universe: &mut Universe,
        config: &GameConfig,
        rng: &mut impl Rng,
    ) -> Result<(), WorldError> {
        debug!(
            "session {} ({}): {}",
            session.id,
            session.display_name(),
            command.name()
        );
        match command {
            Command::Register { name, password } => {
                universe.register(&name, &password)?;
                session.bind(name.trim());
                Ok(())
            }
            Command::Login { name, password } => {
                universe.login(&name, &password)?;
                session.bind(name.trim());
                Ok(())
            }
            Command::JoinGame { ship_name } => {
                let username = self.authenticated(session)?;
                universe.join_game(&username, &ship_name, config, rng)?;
                Ok(())
            }
            Command::Move { direction } => {
                let username = self.authenticated(session)?;
                universe.move_ship(&username, direction, config, rng)?;
                Ok(())
            }
            Command::Dock { id } => {
                let username = self.authenticated(session)?;
                universe.dock(&username, &id)
            }
            Command::Undock => {
                let username = self.authenticated(session)?;
                universe.undock(&username)?;
                Ok(())
            }
            Command::Buy { item, quantity } => {
                let username = self.authenticated(session)?;
                universe.buy(&username, &item, quantity)?;
                Ok(())
            }
            Command::Sell { item, quantity } => {
                let username = self.authenticated(session)?;
                universe.sell(&username, &item, quantity)?;
                Ok(())
            }
        }
    }

    fn authenticated(&self, session: &Session) -> Result<String, WorldError> {
        session
            .username
            .clone()
            .ok_or_else(|| WorldError::precondition("log in first"))
    }
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}
