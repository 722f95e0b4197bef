//! The universe store: every live entity, grouped by kind, plus the
//! polymorphic location resolver and the mutating world operations the
//! command dispatcher drives.
//!
//! The store owns all entities outright; users and ships refer to other
//! entities only by id or coordinates. Sessions share one `Universe` behind
//! a lock, so every operation here is synchronous and performs no I/O.

use std::collections::HashMap;

use chrono::Utc;
use log::{debug, info};
use rand::Rng;

use crate::auth;
use crate::config::GameConfig;
use crate::storage::{Store, StorageError};
use crate::world::coordinates::{Coordinates, Direction};
use crate::world::entity::{
    EntityId, GameObject, Location, ObjectKind, Sector, User, UserStatus,
};
use crate::world::errors::WorldError;
use crate::world::names;
use crate::world::sector;
use crate::world::trade::{self, TradeParty};

/// What a location resolves to.
#[derive(Debug, PartialEq)]
pub enum Resolved<'a> {
    Sector(&'a Sector),
    Object(&'a GameObject),
    /// No location set, or nothing lives at the referenced place.
    Nowhere,
}

/// Process-wide collections of every entity kind.
#[derive(Debug, Default)]
pub struct Universe {
    pub users: HashMap<String, User>,
    pub ships: HashMap<EntityId, GameObject>,
    pub sectors: HashMap<Coordinates, Sector>,
    pub stars: HashMap<Coordinates, Vec<GameObject>>,
    pub planets: HashMap<Coordinates, Vec<GameObject>>,
    pub stations: HashMap<Coordinates, Vec<GameObject>>,
    pub ports: HashMap<Coordinates, Vec<GameObject>>,
}

impl Universe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every kind from the store. Kinds with no backing snapshot come
    /// up empty rather than failing.
    pub fn load(store: &Store) -> Result<Self, StorageError> {
        let universe = Self {
            users: store.load_users()?,
            ships: store.load_ships()?,
            sectors: store.load_sectors()?,
            stars: store.load_objects(ObjectKind::Star)?,
            planets: store.load_objects(ObjectKind::Planet)?,
            stations: store.load_objects(ObjectKind::Station)?,
            ports: store.load_objects(ObjectKind::Port)?,
        };
        info!(
            "universe loaded: {} users, {} ships, {} sectors",
            universe.users.len(),
            universe.ships.len(),
            universe.sectors.len()
        );
        Ok(universe)
    }

    /// Save every kind back to the store as whole units.
    pub fn save(&self, store: &Store) -> Result<(), StorageError> {
        store.save_users(&self.users)?;
        store.save_ships(&self.ships)?;
        store.save_sectors(&self.sectors)?;
        store.save_objects(ObjectKind::Star, &self.stars)?;
        store.save_objects(ObjectKind::Planet, &self.planets)?;
        store.save_objects(ObjectKind::Station, &self.stations)?;
        store.save_objects(ObjectKind::Port, &self.ports)?;
        info!(
            "universe saved: {} users, {} ships, {} sectors",
            self.users.len(),
            self.ships.len(),
            self.sectors.len()
        );
        Ok(())
    }

    pub fn objects_of(&self, kind: ObjectKind) -> &HashMap<Coordinates, Vec<GameObject>> {
        match kind {
            ObjectKind::Star => &self.stars,
            ObjectKind::Planet => &self.planets,
            ObjectKind::Station => &self.stations,
            ObjectKind::Port => &self.ports,
            ObjectKind::Ship => unreachable!("ships are keyed by id, not coordinates"),
        }
    }

    pub(crate) fn objects_of_mut(
        &mut self,
        kind: ObjectKind,
    ) -> &mut HashMap<Coordinates, Vec<GameObject>> {
        match kind {
            ObjectKind::Star => &mut self.stars,
            ObjectKind::Planet => &mut self.planets,
            ObjectKind::Station => &mut self.stations,
            ObjectKind::Port => &mut self.ports,
            ObjectKind::Ship => unreachable!("ships are keyed by id, not coordinates"),
        }
    }

    /// Everything generated at `coordinates`, in kind order.
    pub fn contents_at(&self, coordinates: Coordinates) -> Vec<&GameObject> {
        let mut contents = Vec::new();
        for kind in ObjectKind::SECTOR_KINDS {
            if let Some(group) = self.objects_of(kind).get(&coordinates) {
                contents.extend(group.iter());
            }
        }
        contents
    }

    /// Resolve a location to the entity it names.
    ///
    /// Coordinates look up the sector collection. An entity id searches
    /// ships first, then falls back to a linear scan of the manmade
    /// category collections. Read-only; an unset location is `Nowhere`.
    pub fn resolve(&self, location: Option<&Location>) -> Resolved<'_> {
        match location {
            None => Resolved::Nowhere,
            Some(Location::Coords(coordinates)) => match self.sectors.get(coordinates) {
                Some(sector) => Resolved::Sector(sector),
                None => Resolved::Nowhere,
            },
            Some(Location::Entity(id)) => {
                if let Some(ship) = self.ships.get(id) {
                    return Resolved::Object(ship);
                }
                match self.manmade_by_id(id) {
                    Some(object) => Resolved::Object(object),
                    None => Resolved::Nowhere,
                }
            }
        }
    }

    /// Where an entity is: resolves its own `location` field.
    pub fn location_of(&self, entity: &GameObject) -> Resolved<'_> {
        self.resolve(entity.location.as_ref())
    }

    fn manmade_by_id(&self, id: &str) -> Option<&GameObject> {
        for kind in ObjectKind::SECTOR_KINDS.iter().filter(|k| k.is_manmade()) {
            for group in self.objects_of(*kind).values() {
                if let Some(object) = group.iter().find(|o| o.id == id) {
                    return Some(object);
                }
            }
        }
        None
    }

    fn business_mut<'a>(
        stations: &'a mut HashMap<Coordinates, Vec<GameObject>>,
        ports: &'a mut HashMap<Coordinates, Vec<GameObject>>,
        id: &str,
    ) -> Option<&'a mut GameObject> {
        stations
            .values_mut()
            .chain(ports.values_mut())
            .flat_map(|group| group.iter_mut())
            .find(|object| object.id == id)
    }

    /// The ship a user is piloting, if they have joined the game.
    pub fn ship_of(&self, username: &str) -> Option<&GameObject> {
        let user = self.users.get(&username.to_ascii_lowercase())?;
        let ship_id = user.location.as_ref()?;
        self.ships.get(ship_id)
    }

    fn ship_id_of(&self, username: &str) -> Result<EntityId, WorldError> {
        self.users
            .get(&username.to_ascii_lowercase())
            .ok_or_else(|| WorldError::auth(format!("unknown user '{username}'")))?
            .location
            .clone()
            .ok_or_else(|| WorldError::precondition("no ship; join the game first"))
    }

    // ------------------------------------------------------------------
    // World operations, one per dispatcher command.
    // ------------------------------------------------------------------

    /// Create an account and log it straight in, returning the session token.
    pub fn register(&mut self, name: &str, password: &str) -> Result<String, WorldError> {
        let name = name.trim();
        if name.is_empty() || password.is_empty() {
            return Err(WorldError::validation("name and password are required"));
        }
        if name.len() > 32 {
            return Err(WorldError::validation("name too long (maximum 32 characters)"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(WorldError::validation(
                "name may only contain letters, digits, '_' and '-'",
            ));
        }
        if password.len() < auth::MIN_PASSWORD_LEN {
            return Err(WorldError::validation("password too short"));
        }
        let key = name.to_ascii_lowercase();
        if self.users.contains_key(&key) {
            return Err(WorldError::auth(format!("username '{name}' is already taken")));
        }

        let hash = auth::hash_password(password)?;
        self.users.insert(key, User::new(name, hash));
        info!("registered user '{}'", name);
        self.login(name, password)
    }

    /// Verify credentials and return the session token, issuing one on the
    /// first successful login and reusing it afterwards.
    pub fn login(&mut self, name: &str, password: &str) -> Result<String, WorldError> {
        let key = name.trim().to_ascii_lowercase();
        let user = self
            .users
            .get_mut(&key)
            .ok_or_else(|| WorldError::auth(format!("unknown user '{name}'")))?;
        if !auth::verify_password(password, &user.password_hash)? {
            return Err(WorldError::auth("invalid password"));
        }
        if user.token.is_none() {
            user.token = Some(auth::new_session_token());
        }
        user.last_login = Utc::now();
        debug!("user '{}' logged in", user.name);
        Ok(user.token.clone().unwrap_or_default())
    }

    /// Put a new player into the world: spawn their ship at the origin
    /// (materializing the origin sector on first use), mark them alive, and
    /// grant starting credits.
    pub fn join_game(
        &mut self,
        username: &str,
        ship_name: &str,
        config: &GameConfig,
        rng: &mut impl Rng,
    ) -> Result<EntityId, WorldError> {
        let key = username.to_ascii_lowercase();
        let status = self
            .users
            .get(&key)
            .ok_or_else(|| WorldError::auth(format!("unknown user '{username}'")))?
            .status;
        if status != UserStatus::New {
            return Err(WorldError::precondition("already in the game"));
        }

        sector::sector_at(self, Coordinates::ORIGIN, config, rng);

        let name = if ship_name.trim().is_empty() {
            names::object_name(ObjectKind::Ship, rng)
        } else {
            ship_name.trim().to_string()
        };
        let ship = GameObject::ship(&name, username, Coordinates::ORIGIN, config.ship_holds);
        let ship_id = ship.id.clone();
        self.ships.insert(ship_id.clone(), ship);

        // Lookup can't fail; checked above.
        if let Some(user) = self.users.get_mut(&key) {
            user.location = Some(ship_id.clone());
            user.status = UserStatus::Alive;
            user.credits = config.starting_credits;
        }
        info!("user '{}' joined the game in ship '{}'", username, name);
        Ok(ship_id)
    }

    /// Move the user's ship one sector along a cardinal direction,
    /// materializing the destination sector on first visit.
    pub fn move_ship(
        &mut self,
        username: &str,
        direction: Direction,
        config: &GameConfig,
        rng: &mut impl Rng,
    ) -> Result<Coordinates, WorldError> {
        let ship_id = self.ship_id_of(username)?;
        let current = match self.ships.get(&ship_id).and_then(|s| s.location.as_ref()) {
            Some(Location::Coords(coordinates)) => *coordinates,
            Some(Location::Entity(_)) => {
                return Err(WorldError::precondition("docked; undock before moving"))
            }
            None => return Err(WorldError::precondition("ship is adrift")),
        };

        let destination = current.adjacent(direction);
        sector::sector_at(self, destination, config, rng);
        if let Some(ship) = self.ships.get_mut(&ship_id) {
            ship.location = Some(Location::Coords(destination));
        }
        debug!(
            "ship {} moved {} to {}",
            ship_id,
            direction.wire_name(),
            destination
        );
        Ok(destination)
    }

    /// Dock the user's ship at a dockable object in the current sector.
    pub fn dock(&mut self, username: &str, target_id: &str) -> Result<(), WorldError> {
        let ship_id = self.ship_id_of(username)?;
        let here = match self.ships.get(&ship_id).and_then(|s| s.location.as_ref()) {
            Some(Location::Coords(coordinates)) => *coordinates,
            _ => return Err(WorldError::precondition("not in open space")),
        };

        let dockable = self
            .contents_at(here)
            .into_iter()
            .any(|object| object.id == target_id && object.dockable);
        if !dockable {
            return Err(WorldError::not_found(format!(
                "no dockable object '{target_id}' in this sector"
            )));
        }

        if let Some(ship) = self.ships.get_mut(&ship_id) {
            ship.location = Some(Location::Entity(target_id.to_string()));
        }
        debug!("ship {} docked at {}", ship_id, target_id);
        Ok(())
    }

    /// Release the ship back into the sector the docked object sits in.
    pub fn undock(&mut self, username: &str) -> Result<Coordinates, WorldError> {
        let ship_id = self.ship_id_of(username)?;
        let docked_at = match self.ships.get(&ship_id).and_then(|s| s.location.as_ref()) {
            Some(Location::Entity(id)) => id.clone(),
            _ => return Err(WorldError::precondition("not docked")),
        };

        let coordinates = match self.manmade_by_id(&docked_at).and_then(|o| o.location.as_ref()) {
            Some(Location::Coords(coordinates)) => *coordinates,
            _ => {
                return Err(WorldError::not_found(format!(
                    "docked object '{docked_at}' has no sector"
                )))
            }
        };

        if let Some(ship) = self.ships.get_mut(&ship_id) {
            ship.location = Some(Location::Coords(coordinates));
        }
        debug!("ship {} undocked into {}", ship_id, coordinates);
        Ok(coordinates)
    }

    /// The business the user's ship is currently docked at.
    fn docked_business_id(&self, username: &str) -> Result<EntityId, WorldError> {
        let ship_id = self.ship_id_of(username)?;
        let docked_at = match self.ships.get(&ship_id).and_then(|s| s.location.as_ref()) {
            Some(Location::Entity(id)) => id.clone(),
            _ => return Err(WorldError::precondition("not docked")),
        };
        let object = self
            .manmade_by_id(&docked_at)
            .ok_or_else(|| WorldError::not_found(format!("docked object '{docked_at}'")))?;
        if !object.is_business {
            return Err(WorldError::precondition(format!(
                "{} does not trade",
                object.name
            )));
        }
        Ok(object.id.clone())
    }

    /// Buy `quantity` of `item` from the docked business. The business's
    /// selling price is authoritative. Returns the credits spent.
    pub fn buy(&mut self, username: &str, item: &str, quantity: u32) -> Result<i64, WorldError> {
        let business_id = self.docked_business_id(username)?;
        let ship_id = self.ship_id_of(username)?;
        let price = {
            let business = self
                .manmade_by_id(&business_id)
                .ok_or_else(|| WorldError::not_found(format!("business '{business_id}'")))?;
            trade::price_of(business, item)?
        };

        let key = username.to_ascii_lowercase();
        let user = self
            .users
            .get_mut(&key)
            .ok_or_else(|| WorldError::auth(format!("unknown user '{username}'")))?;
        let ship = self
            .ships
            .get_mut(&ship_id)
            .ok_or_else(|| WorldError::not_found(format!("ship '{ship_id}'")))?;
        let business = Self::business_mut(&mut self.stations, &mut self.ports, &business_id)
            .ok_or_else(|| WorldError::not_found(format!("business '{business_id}'")))?;

        let cost = trade::trade(
            item,
            quantity,
            price.selling,
            TradeParty::new(&mut ship.cargo, &mut user.credits),
            TradeParty::new(&mut business.cargo, &mut business.credits),
        )?;
        info!(
            "user '{}' bought {} {} for {} credits",
            username, quantity, item, cost
        );
        Ok(cost)
    }

    /// Sell `quantity` of `item` to the docked business at its buying
    /// price. Returns the credits received.
    pub fn sell(&mut self, username: &str, item: &str, quantity: u32) -> Result<i64, WorldError> {
        let business_id = self.docked_business_id(username)?;
        let ship_id = self.ship_id_of(username)?;
        let price = {
            let business = self
                .manmade_by_id(&business_id)
                .ok_or_else(|| WorldError::not_found(format!("business '{business_id}'")))?;
            trade::price_of(business, item)?
        };

        let key = username.to_ascii_lowercase();
        let user = self
            .users
            .get_mut(&key)
            .ok_or_else(|| WorldError::auth(format!("unknown user '{username}'")))?;
        let ship = self
            .ships
            .get_mut(&ship_id)
            .ok_or_else(|| WorldError::not_found(format!("ship '{ship_id}'")))?;
        let business = Self::business_mut(&mut self.stations, &mut self.ports, &business_id)
            .ok_or_else(|| WorldError::not_found(format!("business '{business_id}'")))?;

        let earned = trade::trade(
            item,
            quantity,
            price.buying,
            TradeParty::new(&mut business.cargo, &mut business.credits),
            TradeParty::new(&mut ship.cargo, &mut user.credits),
        )?;
        info!(
            "user '{}' sold {} {} for {} credits",
            username, quantity, item, earned
        );
        Ok(earned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::commodity::{count_of, CargoStack};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn joined_universe() -> (Universe, GameConfig, StdRng) {
        let mut universe = Universe::new();
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(99);
        universe.register("matt", "pw").expect("register");
        universe
            .join_game("matt", "Falcon", &config, &mut rng)
            .expect("join");
        (universe, config, rng)
    }

    /// Plant a known port at the ship's location and dock there.
    fn dock_at_test_port(universe: &mut Universe) -> EntityId {
        let port = GameObject::new(
            ObjectKind::Port,
            "Port 999",
            Some(Location::Coords(Coordinates::ORIGIN)),
        )
        .with_holds(100)
        .with_cargo(vec![
            CargoStack::new("ore", 50),
            CargoStack::new("organics", 30),
            CargoStack::new("equipment", 20),
        ])
        .with_credits(5000)
        .dockable()
        .business();
        let port_id = port.id.clone();
        universe
            .ports
            .entry(Coordinates::ORIGIN)
            .or_default()
            .push(port);
        universe.dock("matt", &port_id).expect("dock");
        port_id
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut universe = Universe::new();
        universe.register("matt", "pw").expect("register");
        assert!(matches!(
            universe.register("Matt", "other"),
            Err(WorldError::Auth(_))
        ));
    }

    #[test]
    fn login_token_is_stable() {
        let mut universe = Universe::new();
        let first = universe.register("matt", "pw").expect("register");
        let second = universe.login("matt", "pw").expect("login");
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn login_rejects_wrong_password() {
        let mut universe = Universe::new();
        universe.register("matt", "pw").expect("register");
        assert!(matches!(
            universe.login("matt", "nope"),
            Err(WorldError::Auth(_))
        ));
    }

    #[test]
    fn join_game_spawns_at_origin() {
        let (universe, _, _) = joined_universe();
        let user = universe.users.get("matt").expect("user");
        assert_eq!(user.status, UserStatus::Alive);
        assert_eq!(user.credits, 1000);
        let ship = universe.ship_of("matt").expect("ship");
        assert_eq!(
            ship.location,
            Some(Location::Coords(Coordinates::ORIGIN))
        );
        assert!(universe.sectors.contains_key(&Coordinates::ORIGIN));
    }

    #[test]
    fn join_game_twice_is_a_precondition_error() {
        let (mut universe, config, mut rng) = joined_universe();
        assert!(matches!(
            universe.join_game("matt", "Second", &config, &mut rng),
            Err(WorldError::Precondition(_))
        ));
    }

    #[test]
    fn move_materializes_and_memoizes_sectors() {
        let (mut universe, config, mut rng) = joined_universe();
        let origin_sector_id = universe.sectors[&Coordinates::ORIGIN].id.clone();

        let north = universe
            .move_ship("matt", Direction::North, &config, &mut rng)
            .expect("move n");
        assert_eq!(north, Coordinates::new(0, 1, 0));
        assert!(universe.sectors.contains_key(&north));

        let back = universe
            .move_ship("matt", Direction::South, &config, &mut rng)
            .expect("move s");
        assert_eq!(back, Coordinates::ORIGIN);
        // Original sector instance survives the round trip.
        assert_eq!(universe.sectors[&Coordinates::ORIGIN].id, origin_sector_id);
    }

    #[test]
    fn resolver_walks_user_to_ship_to_sector() {
        let (universe, _, _) = joined_universe();
        let user = universe.users.get("matt").expect("user");
        let ship = match universe.resolve(
            user.location
                .clone()
                .map(Location::Entity)
                .as_ref(),
        ) {
            Resolved::Object(ship) => ship,
            other => panic!("expected ship, got {:?}", other),
        };
        match universe.location_of(ship) {
            Resolved::Sector(sector) => {
                assert_eq!(sector.coordinates, Coordinates::ORIGIN)
            }
            other => panic!("expected sector, got {:?}", other),
        }
    }

    #[test]
    fn unset_location_resolves_to_nowhere() {
        let universe = Universe::new();
        assert_eq!(universe.resolve(None), Resolved::Nowhere);
    }

    #[test]
    fn dock_requires_a_dockable_object_here() {
        let (mut universe, _, _) = joined_universe();
        assert!(matches!(
            universe.dock("matt", "no-such-id"),
            Err(WorldError::NotFound(_))
        ));
    }

    #[test]
    fn dock_undock_round_trip() {
        let (mut universe, _, _) = joined_universe();
        let port_id = dock_at_test_port(&mut universe);

        let ship = universe.ship_of("matt").expect("ship");
        assert_eq!(ship.location, Some(Location::Entity(port_id)));

        let coordinates = universe.undock("matt").expect("undock");
        assert_eq!(coordinates, Coordinates::ORIGIN);
        let ship = universe.ship_of("matt").expect("ship");
        assert_eq!(
            ship.location,
            Some(Location::Coords(Coordinates::ORIGIN))
        );
    }

    #[test]
    fn buy_moves_cargo_and_credits() {
        let (mut universe, _, _) = joined_universe();
        dock_at_test_port(&mut universe);

        // Port at 50/100 ore prices at base value: 10 credits a unit.
        let cost = universe.buy("matt", "ore", 10).expect("buy");
        assert_eq!(cost, 100);

        let user = universe.users.get("matt").expect("user");
        assert_eq!(user.credits, 900);
        let ship = universe.ship_of("matt").expect("ship");
        assert_eq!(count_of(&ship.cargo, "ore"), 10);

        let port = universe
            .ports
            .get(&Coordinates::ORIGIN)
            .and_then(|g| g.last())
            .expect("port");
        assert_eq!(count_of(&port.cargo, "ore"), 40);
        assert_eq!(port.credits, 5100);
    }

    #[test]
    fn sell_uses_the_business_buying_price() {
        let (mut universe, _, _) = joined_universe();
        dock_at_test_port(&mut universe);
        universe.buy("matt", "ore", 10).expect("buy");

        // Port now at 40/100 ore: y = -0.1, buying = 10 * 0.9 = 9 a unit.
        let earned = universe.sell("matt", "ore", 10).expect("sell");
        assert_eq!(earned, 90);

        let ship = universe.ship_of("matt").expect("ship");
        assert_eq!(count_of(&ship.cargo, "ore"), 0);
    }

    #[test]
    fn trading_requires_being_docked() {
        let (mut universe, _, _) = joined_universe();
        assert!(matches!(
            universe.buy("matt", "ore", 1),
            Err(WorldError::Precondition(_))
        ));
    }

    #[test]
    fn failed_buy_leaves_everything_unchanged() {
        let (mut universe, _, _) = joined_universe();
        dock_at_test_port(&mut universe);

        // 10_000 units cost far more than 1000 starting credits.
        assert!(matches!(
            universe.buy("matt", "ore", 10_000),
            Err(WorldError::Resource(_))
        ));
        let user = universe.users.get("matt").expect("user");
        assert_eq!(user.credits, 1000);
        let ship = universe.ship_of("matt").expect("ship");
        assert!(ship.cargo.is_empty());
    }
}
