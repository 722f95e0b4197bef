//! Sled-backed persistence for the universe.
//!
//! Every entity kind lives under its own key prefix in a single tree:
//! `users:<name>`, `ships:<id>`, `sectors:<x:y:z>`, and one prefix per
//! sector-object kind (`stars:`, `planets:`, `stations:`, `ports:`). Values
//! are bincode with a schema version checked on load. The store is an opaque
//! snapshot layer: the world engine loads whole kinds at startup and saves
//! whole kinds at shutdown, never reading through it mid-command.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sled::IVec;
use thiserror::Error;

use crate::world::coordinates::Coordinates;
use crate::world::entity::{
    EntityId, GameObject, Location, ObjectKind, Sector, User, OBJECT_SCHEMA_VERSION,
    SECTOR_SCHEMA_VERSION, USER_SCHEMA_VERSION,
};

const TREE_UNIVERSE: &str = "universe";

/// Errors that can arise while interacting with the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct StoreBuilder {
    path: PathBuf,
    wipe: bool,
}

impl StoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wipe: false,
        }
    }

    /// Discard all persisted state before the first load (the `--bigbang`
    /// startup flag).
    pub fn wipe_existing(mut self) -> Self {
        self.wipe = true;
        self
    }

    pub fn open(self) -> Result<Store, StorageError> {
        Store::open_with_options(self.path, self.wipe)
    }
}

/// Sled-backed persistence for universe entities.
pub struct Store {
    _db: sled::Db,
    tree: sled::Tree,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::open_with_options(path, false)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, wipe: bool) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let tree = db.open_tree(TREE_UNIVERSE)?;
        if wipe {
            tree.clear()?;
            tree.flush()?;
        }
        Ok(Self { _db: db, tree })
    }

    fn user_key(name: &str) -> Vec<u8> {
        format!("users:{}", name.to_ascii_lowercase()).into_bytes()
    }

    fn ship_key(id: &str) -> Vec<u8> {
        format!("ships:{}", id).into_bytes()
    }

    fn sector_key(coordinates: Coordinates) -> Vec<u8> {
        format!("sectors:{}", coordinates.storage_key()).into_bytes()
    }

    fn object_prefix(kind: ObjectKind) -> &'static str {
        match kind {
            ObjectKind::Star => "stars:",
            ObjectKind::Planet => "planets:",
            ObjectKind::Station => "stations:",
            ObjectKind::Port => "ports:",
            ObjectKind::Ship => "ships:",
        }
    }

    fn object_key(kind: ObjectKind, object: &GameObject) -> Vec<u8> {
        format!("{}{}", Self::object_prefix(kind), object.id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StorageError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Delete every record under a key prefix.
    fn clear_prefix(&self, prefix: &[u8]) -> Result<(), StorageError> {
        let keys: Result<Vec<_>, _> = self
            .tree
            .scan_prefix(prefix)
            .map(|entry| entry.map(|(key, _)| key))
            .collect();
        for key in keys? {
            self.tree.remove(key)?;
        }
        Ok(())
    }

    /// Insert or update a single user record.
    pub fn put_user(&self, mut user: User) -> Result<(), StorageError> {
        user.schema_version = USER_SCHEMA_VERSION;
        let bytes = Self::serialize(&user)?;
        self.tree.insert(Self::user_key(&user.name), bytes)?;
        self.tree.flush()?;
        Ok(())
    }

    /// Load the whole user kind. An empty or missing snapshot yields an
    /// empty map, not an error.
    pub fn load_users(&self) -> Result<HashMap<String, User>, StorageError> {
        let mut users = HashMap::new();
        for entry in self.tree.scan_prefix(b"users:") {
            let (_, bytes) = entry?;
            let user: User = Self::deserialize(bytes)?;
            if user.schema_version != USER_SCHEMA_VERSION {
                return Err(StorageError::SchemaMismatch {
                    entity: "user",
                    expected: USER_SCHEMA_VERSION,
                    found: user.schema_version,
                });
            }
            users.insert(user.name.to_ascii_lowercase(), user);
        }
        Ok(users)
    }

    /// Replace the whole user kind with `users`.
    pub fn save_users(&self, users: &HashMap<String, User>) -> Result<(), StorageError> {
        self.clear_prefix(b"users:")?;
        for user in users.values() {
            let mut record = user.clone();
            record.schema_version = USER_SCHEMA_VERSION;
            let bytes = Self::serialize(&record)?;
            self.tree.insert(Self::user_key(&record.name), bytes)?;
        }
        self.tree.flush()?;
        Ok(())
    }

    pub fn load_ships(&self) -> Result<HashMap<EntityId, GameObject>, StorageError> {
        let mut ships = HashMap::new();
        for entry in self.tree.scan_prefix(b"ships:") {
            let (_, bytes) = entry?;
            let ship: GameObject = Self::deserialize(bytes)?;
            if ship.schema_version != OBJECT_SCHEMA_VERSION {
                return Err(StorageError::SchemaMismatch {
                    entity: "ship",
                    expected: OBJECT_SCHEMA_VERSION,
                    found: ship.schema_version,
                });
            }
            ships.insert(ship.id.clone(), ship);
        }
        Ok(ships)
    }

    pub fn save_ships(&self, ships: &HashMap<EntityId, GameObject>) -> Result<(), StorageError> {
        self.clear_prefix(b"ships:")?;
        for ship in ships.values() {
            let mut record = ship.clone();
            record.schema_version = OBJECT_SCHEMA_VERSION;
            let bytes = Self::serialize(&record)?;
            self.tree.insert(Self::ship_key(&record.id), bytes)?;
        }
        self.tree.flush()?;
        Ok(())
    }

    pub fn load_sectors(&self) -> Result<HashMap<Coordinates, Sector>, StorageError> {
        let mut sectors = HashMap::new();
        for entry in self.tree.scan_prefix(b"sectors:") {
            let (_, bytes) = entry?;
            let sector: Sector = Self::deserialize(bytes)?;
            if sector.schema_version != SECTOR_SCHEMA_VERSION {
                return Err(StorageError::SchemaMismatch {
                    entity: "sector",
                    expected: SECTOR_SCHEMA_VERSION,
                    found: sector.schema_version,
                });
            }
            sectors.insert(sector.coordinates, sector);
        }
        Ok(sectors)
    }

    pub fn save_sectors(&self, sectors: &HashMap<Coordinates, Sector>) -> Result<(), StorageError> {
        self.clear_prefix(b"sectors:")?;
        for sector in sectors.values() {
            let mut record = sector.clone();
            record.schema_version = SECTOR_SCHEMA_VERSION;
            let bytes = Self::serialize(&record)?;
            self.tree
                .insert(Self::sector_key(record.coordinates), bytes)?;
        }
        self.tree.flush()?;
        Ok(())
    }

    /// Load one sector-object kind, grouped by the coordinates each object
    /// sits at. Objects whose location is not open space are skipped; sector
    /// contents always sit at coordinates.
    pub fn load_objects(
        &self,
        kind: ObjectKind,
    ) -> Result<HashMap<Coordinates, Vec<GameObject>>, StorageError> {
        let mut groups: HashMap<Coordinates, Vec<GameObject>> = HashMap::new();
        for entry in self.tree.scan_prefix(Self::object_prefix(kind).as_bytes()) {
            let (_, bytes) = entry?;
            let object: GameObject = Self::deserialize(bytes)?;
            if object.schema_version != OBJECT_SCHEMA_VERSION {
                return Err(StorageError::SchemaMismatch {
                    entity: "object",
                    expected: OBJECT_SCHEMA_VERSION,
                    found: object.schema_version,
                });
            }
            if let Some(Location::Coords(coordinates)) = object.location {
                groups.entry(coordinates).or_default().push(object);
            }
        }
        Ok(groups)
    }

    pub fn save_objects(
        &self,
        kind: ObjectKind,
        groups: &HashMap<Coordinates, Vec<GameObject>>,
    ) -> Result<(), StorageError> {
        self.clear_prefix(Self::object_prefix(kind).as_bytes())?;
        for group in groups.values() {
            for object in group {
                let mut record = object.clone();
                record.schema_version = OBJECT_SCHEMA_VERSION;
                let bytes = Self::serialize(&record)?;
                self.tree.insert(Self::object_key(kind, &record), bytes)?;
            }
        }
        self.tree.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn store_round_trip_user() {
        let dir = TempDir::new().expect("tempdir");
        let store = StoreBuilder::new(dir.path()).open().expect("store");
        let mut user = User::new("alice", "hash".into());
        user.credits = 42;
        store.put_user(user.clone()).expect("put");
        let users = store.load_users().expect("load");
        let fetched = users.get("alice").expect("present");
        assert_eq!(fetched.credits, 42);
        assert_eq!(fetched.schema_version, USER_SCHEMA_VERSION);
    }

    #[test]
    fn empty_kind_loads_as_empty_map() {
        let dir = TempDir::new().expect("tempdir");
        let store = StoreBuilder::new(dir.path()).open().expect("store");
        assert!(store.load_users().expect("users").is_empty());
        assert!(store.load_ships().expect("ships").is_empty());
        assert!(store.load_sectors().expect("sectors").is_empty());
        assert!(store
            .load_objects(ObjectKind::Port)
            .expect("ports")
            .is_empty());
    }

    #[test]
    fn save_replaces_the_whole_kind() {
        let dir = TempDir::new().expect("tempdir");
        let store = StoreBuilder::new(dir.path()).open().expect("store");
        store
            .put_user(User::new("stale", "hash".into()))
            .expect("put");

        let mut fresh = HashMap::new();
        fresh.insert(
            "alice".to_string(),
            User::new("alice", "hash".into()),
        );
        store.save_users(&fresh).expect("save");

        let users = store.load_users().expect("load");
        assert!(users.contains_key("alice"));
        assert!(!users.contains_key("stale"));
    }

    #[test]
    fn wipe_discards_persisted_state() {
        let dir = TempDir::new().expect("tempdir");
        {
            let store = StoreBuilder::new(dir.path()).open().expect("store");
            store
                .put_user(User::new("alice", "hash".into()))
                .expect("put");
        }
        let store = StoreBuilder::new(dir.path())
            .wipe_existing()
            .open()
            .expect("reopen");
        assert!(store.load_users().expect("load").is_empty());
    }

    #[test]
    fn objects_group_by_coordinates() {
        let dir = TempDir::new().expect("tempdir");
        let store = StoreBuilder::new(dir.path()).open().expect("store");
        let here = Coordinates::new(2, 3, 0);
        let mut groups: HashMap<Coordinates, Vec<GameObject>> = HashMap::new();
        groups.entry(here).or_default().push(GameObject::new(
            ObjectKind::Star,
            "Rigel",
            Some(Location::Coords(here)),
        ));
        groups.entry(here).or_default().push(GameObject::new(
            ObjectKind::Star,
            "Mizar",
            Some(Location::Coords(here)),
        ));
        store.save_objects(ObjectKind::Star, &groups).expect("save");

        let loaded = store.load_objects(ObjectKind::Star).expect("load");
        assert_eq!(loaded.get(&here).map(|v| v.len()), Some(2));
    }
}
