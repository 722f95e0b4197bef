//! State and command snapshots.
//!
//! After every command the client gets `{state, commands}`: what it can see
//! and what it may legally do next, both derived fresh from the session's
//! classified phase. There is no incremental diffing; each snapshot stands
//! alone.

use serde_json::{json, Map, Value};

use crate::world::coordinates::WIRE_DIRECTIONS;
use crate::world::entity::{GameObject, Location, Sector, User};
use crate::world::universe::Universe;

use super::session::{classify, Session, SessionPhase};

/// Build the full `{state, commands}` payload for a session.
pub fn snapshot(session: &Session, universe: &Universe) -> Value {
    let phase = classify(session, universe);
    let user = session
        .username
        .as_deref()
        .and_then(|name| universe.users.get(&name.to_ascii_lowercase()));

    json!({
        "state": state_payload(&phase, user, universe),
        "commands": commands_payload(&phase, universe),
    })
}

fn state_payload(phase: &SessionPhase<'_>, user: Option<&User>, universe: &Universe) -> Value {
    let mut state = Map::new();
    state.insert("user".to_string(), user_view(user));

    match phase {
        SessionPhase::Anonymous | SessionPhase::Authenticated => {}
        SessionPhase::InShip { ship } => {
            state.insert("ship".to_string(), ship_view(ship));
        }
        SessionPhase::InSector { ship, sector } => {
            state.insert("ship".to_string(), ship_view(ship));
            state.insert("sector".to_string(), sector_view(sector, universe));
        }
        SessionPhase::Docked { ship, object } => {
            state.insert("ship".to_string(), ship_view(ship));
            state.insert("docked".to_string(), docked_view(object));
        }
    }
    Value::Object(state)
}

/// The user as the client sees it. The password hash never leaves the
/// server; the token does, since it is the client's credential.
fn user_view(user: Option<&User>) -> Value {
    match user {
        None => json!({
            "name": null,
            "status": null,
            "credits": null,
            "token": null,
        }),
        Some(user) => json!({
            "name": user.name,
            "status": user.status.wire_name(),
            "credits": user.credits,
            "token": user.token,
        }),
    }
}

fn ship_view(ship: &GameObject) -> Value {
    json!({
        "id": ship.id,
        "name": ship.name,
        "location": location_view(ship.location.as_ref()),
        "holds": ship.holds,
        "cargo": cargo_view(ship),
        "warp": ship.warp,
        "weapons": ship.weapons,
        "hull": ship.hull,
        "shields": ship.shields,
    })
}

fn location_view(location: Option<&Location>) -> Value {
    match location {
        None => Value::Null,
        Some(Location::Coords(c)) => json!({"x": c.x, "y": c.y, "z": c.z}),
        Some(Location::Entity(id)) => json!(id),
    }
}

fn cargo_view(object: &GameObject) -> Value {
    Value::Array(
        object
            .cargo
            .iter()
            .map(|stack| json!({"commodity": stack.commodity, "count": stack.count}))
            .collect(),
    )
}

fn sector_view(sector: &Sector, universe: &Universe) -> Value {
    let contents: Vec<Value> = universe
        .contents_at(sector.coordinates)
        .into_iter()
        .map(|object| {
            json!({
                "id": object.id,
                "name": object.name,
                "kind": object.kind,
                "dockable": object.dockable,
                "is_business": object.is_business,
            })
        })
        .collect();
    json!({
        "name": sector.name,
        "coordinates": {
            "x": sector.coordinates.x,
            "y": sector.coordinates.y,
            "z": sector.coordinates.z,
        },
        "contents": contents,
    })
}

fn docked_view(object: &GameObject) -> Value {
    json!({
        "id": object.id,
        "name": object.name,
        "kind": object.kind,
        "holds": object.holds,
        "cargo": cargo_view(object),
        "is_business": object.is_business,
    })
}

/// The commands legal in this phase, with their argument domains. Params
/// with an open domain are null; params with an enumerable domain list it.
fn commands_payload(phase: &SessionPhase<'_>, universe: &Universe) -> Value {
    let mut commands = Map::new();
    match phase {
        SessionPhase::Anonymous => {
            commands.insert(
                "login".to_string(),
                json!({"name": null, "password": null}),
            );
            commands.insert(
                "register".to_string(),
                json!({"name": null, "password": null}),
            );
        }
        SessionPhase::Authenticated => {
            commands.insert("join_game".to_string(), json!({"ship_name": null}));
        }
        SessionPhase::InShip { .. } => {
            // Adrift: nothing is legal until the world resolves again.
        }
        SessionPhase::InSector { sector, .. } => {
            commands.insert(
                "move".to_string(),
                json!({"direction": WIRE_DIRECTIONS}),
            );
            let targets = dockable_targets(sector, universe);
            if !targets.is_empty() {
                commands.insert("dock".to_string(), json!({"id": targets}));
            }
        }
        SessionPhase::Docked { ship, object } => {
            commands.insert("undock".to_string(), json!({}));
            if object.is_business {
                let stocked: Vec<&str> = object
                    .cargo
                    .iter()
                    .map(|s| s.commodity.as_str())
                    .collect();
                let held: Vec<&str> =
                    ship.cargo.iter().map(|s| s.commodity.as_str()).collect();
                commands.insert(
                    "buy".to_string(),
                    json!({"item": stocked, "quantity": null}),
                );
                commands.insert(
                    "sell".to_string(),
                    json!({"item": held, "quantity": null}),
                );
            }
        }
    }
    Value::Object(commands)
}

fn dockable_targets(sector: &Sector, universe: &Universe) -> Vec<String> {
    universe
        .contents_at(sector.coordinates)
        .into_iter()
        .filter(|object| object.dockable)
        .map(|object| object.id.clone())
        .collect()
}
