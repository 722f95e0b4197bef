//! Per-connection session state.
//!
//! A session tracks one TCP connection: which user it has authenticated as
//! and when it was last active. Everything else - where the player is, what
//! they can do - is derived fresh from the universe by [`classify`], never
//! cached on the session.

use chrono::{DateTime, Utc};

use crate::world::entity::{GameObject, Location, Sector};
use crate::world::universe::{Resolved, Universe};

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub peer: String,
    pub username: Option<String>,
    pub login_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, peer: String) -> Self {
        let now = Utc::now();
        Session {
            id,
            peer,
            username: None,
            login_time: now,
            last_activity: now,
        }
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Bind this connection to an authenticated user.
    pub fn bind(&mut self, username: &str) {
        self.username = Some(username.to_string());
    }

    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    pub fn display_name(&self) -> String {
        self.username.clone().unwrap_or_else(|| "anonymous".to_string())
    }
}

/// The five states a session can be in, with borrowed context for the
/// snapshot builder.
#[derive(Debug)]
pub enum SessionPhase<'a> {
    Anonymous,
    /// Logged in but not yet in the game (no ship).
    Authenticated,
    /// Has a ship whose location is unset or unresolvable.
    InShip { ship: &'a GameObject },
    /// Ship in open space inside a generated sector.
    InSector {
        ship: &'a GameObject,
        sector: &'a Sector,
    },
    /// Ship docked at an object.
    Docked {
        ship: &'a GameObject,
        object: &'a GameObject,
    },
}

/// Classify a session against the current universe.
///
/// Pure and read-only: the snapshot builder and the command legality table
/// both key off the result, so what a client sees and what it may do always
/// agree.
pub fn classify<'a>(session: &Session, universe: &'a Universe) -> SessionPhase<'a> {
    let Some(username) = session.username.as_deref() else {
        return SessionPhase::Anonymous;
    };
    if universe.users.get(&username.to_ascii_lowercase()).is_none() {
        return SessionPhase::Anonymous;
    }
    let Some(ship) = universe.ship_of(username) else {
        return SessionPhase::Authenticated;
    };

    match ship.location.as_ref() {
        Some(Location::Coords(coordinates)) => match universe.sectors.get(coordinates) {
            Some(sector) => SessionPhase::InSector { ship, sector },
            None => SessionPhase::InShip { ship },
        },
        Some(Location::Entity(_)) => match universe.location_of(ship) {
            Resolved::Object(object) => SessionPhase::Docked { ship, object },
            _ => SessionPhase::InShip { ship },
        },
        None => SessionPhase::InShip { ship },
    }
}
