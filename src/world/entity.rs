use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::world::commodity::CargoStack;
use crate::world::coordinates::Coordinates;

pub const USER_SCHEMA_VERSION: u8 = 1;
pub const OBJECT_SCHEMA_VERSION: u8 = 1;
pub const SECTOR_SCHEMA_VERSION: u8 = 1;

/// Globally unique entity identifier, assigned at creation and never reused.
pub type EntityId = String;

fn new_entity_id() -> EntityId {
    Uuid::new_v4().to_string()
}

/// Where an entity is.
///
/// The universe addresses places two ways: open space is a coordinate
/// triple, while "inside/at another entity" (a ship docked at a port, a user
/// aboard a ship) is that entity's id. The resolver in `world::universe`
/// turns either form into the thing it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Coords(Coordinates),
    Entity(EntityId),
}

/// Kinds of objects that occupy the universe.
///
/// Stars and planets are natural; stations and ports are manmade. Id-based
/// location resolution only searches manmade collections (and ships).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Ship,
    Star,
    Planet,
    Station,
    Port,
}

impl ObjectKind {
    pub fn is_manmade(&self) -> bool {
        matches!(self, ObjectKind::Station | ObjectKind::Port)
    }

    /// Kinds spawned by the sector generator, in generation order.
    pub const SECTOR_KINDS: [ObjectKind; 4] = [
        ObjectKind::Star,
        ObjectKind::Planet,
        ObjectKind::Station,
        ObjectKind::Port,
    ];
}

/// The common shape shared by anything that can hold cargo or credits,
/// carry combat stats, and occupy a location: ships, stars, planets,
/// stations, ports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameObject {
    pub id: EntityId,
    pub name: String,
    pub kind: ObjectKind,
    pub location: Option<Location>,
    pub holds: u32,
    #[serde(default)]
    pub cargo: Vec<CargoStack>,
    pub warp: u32,
    pub weapons: u32,
    pub hull: u32,
    pub shields: u32,
    pub credits: i64,
    #[serde(default)]
    pub dockable: bool,
    #[serde(default)]
    pub is_business: bool,
    /// Username of the owning player, for ships.
    #[serde(default)]
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl GameObject {
    pub fn new(kind: ObjectKind, name: &str, location: Option<Location>) -> Self {
        Self {
            id: new_entity_id(),
            name: name.to_string(),
            kind,
            location,
            holds: 0,
            cargo: Vec::new(),
            warp: 0,
            weapons: 0,
            hull: 0,
            shields: 0,
            credits: 0,
            dockable: false,
            is_business: false,
            owner: None,
            created_at: Utc::now(),
            schema_version: OBJECT_SCHEMA_VERSION,
        }
    }

    pub fn with_holds(mut self, holds: u32) -> Self {
        self.holds = holds;
        self
    }

    pub fn with_cargo(mut self, cargo: Vec<CargoStack>) -> Self {
        self.cargo = cargo;
        self
    }

    pub fn with_credits(mut self, credits: i64) -> Self {
        self.credits = credits;
        self
    }

    pub fn dockable(mut self) -> Self {
        self.dockable = true;
        self
    }

    pub fn business(mut self) -> Self {
        self.is_business = true;
        self
    }

    /// A player ship parked in open space at `coordinates`.
    pub fn ship(name: &str, owner: &str, coordinates: Coordinates, holds: u32) -> Self {
        let mut ship = GameObject::new(
            ObjectKind::Ship,
            name,
            Some(Location::Coords(coordinates)),
        )
        .with_holds(holds);
        ship.warp = 1;
        ship.hull = 100;
        ship.owner = Some(owner.to_string());
        ship
    }
}

/// Player lifecycle states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    New,
    Alive,
    Dead,
}

impl UserStatus {
    pub fn wire_name(&self) -> &'static str {
        match self {
            UserStatus::New => "new",
            UserStatus::Alive => "alive",
            UserStatus::Dead => "dead",
        }
    }
}

/// A registered player account.
///
/// `token` is the session credential: generated on the first successful
/// login and stable from then on. `location` holds the player's ship id
/// once they have joined the game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub token: Option<String>,
    pub status: UserStatus,
    #[serde(default)]
    pub location: Option<EntityId>,
    pub credits: i64,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub schema_version: u8,
}

impl User {
    pub fn new(name: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            password_hash,
            token: None,
            status: UserStatus::New,
            location: None,
            credits: 0,
            created_at: now,
            last_login: now,
            schema_version: USER_SCHEMA_VERSION,
        }
    }
}

/// A named region of the universe keyed by its coordinates.
///
/// Sectors carry no child list; their contents are found by scanning the
/// per-kind collections for objects at the same coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sector {
    pub id: EntityId,
    pub name: String,
    pub coordinates: Coordinates,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl Sector {
    pub fn new(name: &str, coordinates: Coordinates) -> Self {
        Self {
            id: new_entity_id(),
            name: name.to_string(),
            coordinates,
            created_at: Utc::now(),
            schema_version: SECTOR_SCHEMA_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_objects_get_unique_ids() {
        let a = GameObject::new(ObjectKind::Star, "Rigel", None);
        let b = GameObject::new(ObjectKind::Star, "Rigel", None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn ships_start_in_open_space() {
        let ship = GameObject::ship("Falcon", "matt", Coordinates::ORIGIN, 50);
        assert_eq!(ship.kind, ObjectKind::Ship);
        assert_eq!(
            ship.location,
            Some(Location::Coords(Coordinates::ORIGIN))
        );
        assert_eq!(ship.holds, 50);
        assert_eq!(ship.owner.as_deref(), Some("matt"));
        assert!(!ship.dockable);
    }

    #[test]
    fn manmade_classification() {
        assert!(ObjectKind::Port.is_manmade());
        assert!(ObjectKind::Station.is_manmade());
        assert!(!ObjectKind::Star.is_manmade());
        assert!(!ObjectKind::Planet.is_manmade());
    }

    #[test]
    fn new_users_have_no_token() {
        let user = User::new("matt", "hash".into());
        assert_eq!(user.status, UserStatus::New);
        assert!(user.token.is_none());
        assert!(user.location.is_none());
    }
}
