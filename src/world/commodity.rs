use serde::{Deserialize, Serialize};

/// A tradeable good in the fixed catalog.
///
/// `value` is the base price; actual buy/sell prices are derived from it by
/// the trade engine depending on how much of the commodity a business holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commodity {
    pub id: &'static str,
    pub name: &'static str,
    pub value: i64,
}

/// The catalog, in the order ports stock their holds.
pub const CATALOG: [Commodity; 3] = [
    Commodity {
        id: "ore",
        name: "Fuel Ore",
        value: 10,
    },
    Commodity {
        id: "organics",
        name: "Organics",
        value: 20,
    },
    Commodity {
        id: "equipment",
        name: "Equipment",
        value: 30,
    },
];

/// Look up a catalog entry by its stable id.
pub fn by_id(id: &str) -> Option<&'static Commodity> {
    CATALOG.iter().find(|c| c.id == id)
}

/// A quantity of one commodity inside some entity's cargo hold.
///
/// Stacks are unique per commodity id within a cargo list. A stack whose
/// count has been traded down to zero may remain in the list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CargoStack {
    pub commodity: String,
    pub count: u32,
}

impl CargoStack {
    pub fn new(commodity: &str, count: u32) -> Self {
        Self {
            commodity: commodity.to_string(),
            count,
        }
    }
}

/// Total units held across all stacks in a cargo list.
pub fn total_units(cargo: &[CargoStack]) -> u32 {
    cargo.iter().map(|s| s.count).sum()
}

/// Count of one commodity in a cargo list; a missing stack counts zero.
pub fn count_of(cargo: &[CargoStack], commodity_id: &str) -> u32 {
    cargo
        .iter()
        .find(|s| s.commodity == commodity_id)
        .map(|s| s.count)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup() {
        assert_eq!(by_id("ore").map(|c| c.value), Some(10));
        assert_eq!(by_id("organics").map(|c| c.name), Some("Organics"));
        assert_eq!(by_id("equipment").map(|c| c.value), Some(30));
        assert!(by_id("dilithium").is_none());
    }

    #[test]
    fn missing_stack_counts_zero() {
        let cargo = vec![CargoStack::new("ore", 5)];
        assert_eq!(count_of(&cargo, "ore"), 5);
        assert_eq!(count_of(&cargo, "organics"), 0);
        assert_eq!(total_units(&cargo), 5);
    }
}
