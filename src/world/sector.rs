//! Lazy procedural sector generation.
//!
//! Sectors materialize the first time a coordinate is visited and are
//! memoized forever after: revisiting returns the same sector, contents
//! untouched. Content counts per kind are geometrically distributed - each
//! kind keeps spawning while a uniform draw stays at or under its configured
//! probability, so zero is always possible and long runs are rare.

use log::debug;
use rand::Rng;

use crate::config::GameConfig;
use crate::world::commodity::{CargoStack, CATALOG};
use crate::world::coordinates::Coordinates;
use crate::world::entity::{GameObject, Location, ObjectKind, Sector};
use crate::world::names;
use crate::world::universe::Universe;

/// Return the sector at `coordinates`, generating it and its contents on
/// first visit. Idempotent per coordinate.
pub fn sector_at<'a>(
    universe: &'a mut Universe,
    coordinates: Coordinates,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> &'a Sector {
    if !universe.sectors.contains_key(&coordinates) {
        generate(universe, coordinates, config, rng);
    }
    &universe.sectors[&coordinates]
}

fn generate(
    universe: &mut Universe,
    coordinates: Coordinates,
    config: &GameConfig,
    rng: &mut impl Rng,
) {
    let sector = Sector::new(&names::sector_name(rng), coordinates);
    debug!("generating sector '{}' at {}", sector.name, coordinates);
    universe.sectors.insert(coordinates, sector);

    for kind in ObjectKind::SECTOR_KINDS {
        let probability = config.spawn_probability(kind);
        while rng.gen::<f64>() <= probability {
            let object = spawn(kind, coordinates, config, rng);
            debug!("  spawned {:?} '{}'", kind, object.name);
            universe
                .objects_of_mut(kind)
                .entry(coordinates)
                .or_default()
                .push(object);
        }
    }
}

fn spawn(
    kind: ObjectKind,
    coordinates: Coordinates,
    config: &GameConfig,
    rng: &mut impl Rng,
) -> GameObject {
    let name = names::object_name(kind, rng);
    let object = GameObject::new(kind, &name, Some(Location::Coords(coordinates)));
    match kind {
        ObjectKind::Station => object.dockable(),
        ObjectKind::Port => object
            .dockable()
            .business()
            .with_holds(config.port_holds)
            .with_cargo(stock_holds(config.port_holds, rng))
            .with_credits(config.port_credits),
        _ => object,
    }
}

/// Split `holds` units across the commodity catalog by repeatedly taking a
/// random share of what's left; the last commodity takes the remainder, so
/// the stacks always sum to `holds`.
fn stock_holds(holds: u32, rng: &mut impl Rng) -> Vec<CargoStack> {
    let mut remaining = holds;
    let mut stacks = Vec::with_capacity(CATALOG.len());
    for (index, commodity) in CATALOG.iter().enumerate() {
        let count = if index == CATALOG.len() - 1 {
            remaining
        } else {
            rng.gen_range(0..=remaining)
        };
        remaining -= count;
        stacks.push(CargoStack::new(commodity.id, count));
    }
    stacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::commodity::total_units;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generation_is_memoized_per_coordinate() {
        let mut universe = Universe::new();
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let here = Coordinates::new(3, -1, 0);

        let first_id = sector_at(&mut universe, here, &config, &mut rng).id.clone();
        let star_count = universe.stars.get(&here).map(|g| g.len()).unwrap_or(0);

        let second_id = sector_at(&mut universe, here, &config, &mut rng).id.clone();
        assert_eq!(first_id, second_id);
        assert_eq!(
            universe.stars.get(&here).map(|g| g.len()).unwrap_or(0),
            star_count
        );
    }

    #[test]
    fn ports_stock_to_exactly_their_holds() {
        let mut universe = Universe::new();
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(2);

        // Generate until at least one port exists.
        let mut x = 0;
        let here = loop {
            let here = Coordinates::new(x, 0, 0);
            sector_at(&mut universe, here, &config, &mut rng);
            if universe.ports.get(&here).is_some_and(|g| !g.is_empty()) {
                break here;
            }
            x += 1;
        };
        let port = universe
            .ports
            .get(&here)
            .and_then(|g| g.first())
            .expect("port generated");

        assert_eq!(port.holds, 100);
        assert_eq!(total_units(&port.cargo), 100);
        assert_eq!(port.cargo.len(), 3);
        assert!(port.dockable);
        assert!(port.is_business);
        assert_eq!(port.credits, 5000);
    }

    #[test]
    fn spawn_counts_follow_a_geometric_mean() {
        let mut universe = Universe::new();
        let config = GameConfig::default();
        let mut rng = StdRng::seed_from_u64(3);

        let trials = 2000;
        let mut total = 0usize;
        for x in 0..trials {
            let here = Coordinates::new(x, 1000, 0);
            sector_at(&mut universe, here, &config, &mut rng);
            total += universe.stars.get(&here).map(|g| g.len()).unwrap_or(0);
        }

        // Mean of a geometric count at p=0.5 is p/(1-p) = 1; allow slack
        // for sampling noise at this trial count.
        let mean = total as f64 / trials as f64;
        assert!(
            (0.85..1.15).contains(&mean),
            "empirical mean {mean} outside tolerance"
        );
    }

    #[test]
    fn zero_probability_spawns_nothing() {
        let mut universe = Universe::new();
        let mut config = GameConfig::default();
        config.star_probability = 0.0;
        config.planet_probability = 0.0;
        config.station_probability = 0.0;
        config.port_probability = 0.0;
        let mut rng = StdRng::seed_from_u64(4);

        let here = Coordinates::new(9, 9, 9);
        sector_at(&mut universe, here, &config, &mut rng);
        assert!(universe.contents_at(here).is_empty());
    }

    #[test]
    fn stocked_stacks_cover_the_catalog() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let stacks = stock_holds(100, &mut rng);
            assert_eq!(stacks.len(), 3);
            assert_eq!(total_units(&stacks), 100);
            assert_eq!(stacks[0].commodity, "ore");
            assert_eq!(stacks[1].commodity, "organics");
            assert_eq!(stacks[2].commodity, "equipment");
        }
    }
}
