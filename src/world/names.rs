//! Display-name generators for procedurally created entities.
//!
//! Each kind draws from its own pool: stars use catalog names, planets use
//! invented ones, stations and ports get numbered designations.

use rand::Rng;

use crate::world::entity::ObjectKind;

/// Names for stars, via http://simbad.u-strasbg.fr/simbad
const STAR_NAMES: [&str; 10] = [
    "Al Dhanab",
    "Arneb",
    "Alrescha",
    "Gacrux",
    "Matar",
    "Mizar",
    "Okda",
    "Phact",
    "Rigel",
    "Sabik",
];

const PLANET_NAMES: [&str; 10] = [
    "Latania",
    "Efryria",
    "Glaonides",
    "Uewhiuq",
    "Skoyotania",
    "Oxfrion",
    "Wheyayama",
    "Auflhone",
    "Thiokeiliv",
    "Oiwuichiri",
];

const SECTOR_NAMES: [&str; 12] = [
    "Cygnus Reach",
    "Perseus Drift",
    "Orion Verge",
    "Lyra Expanse",
    "Draco Shallows",
    "Vela Rift",
    "Cetus Margin",
    "Auriga Span",
    "Corvus Deep",
    "Hydra Narrows",
    "Pavo Crossing",
    "Tucana Verge",
];

const SHIP_NAMES: [&str; 8] = [
    "Wayfarer",
    "Stardust",
    "Meridian",
    "Kestrel",
    "Vagrant",
    "Sunchaser",
    "Windlass",
    "Farlight",
];

fn pick(pool: &[&str], rng: &mut impl Rng) -> String {
    pool[rng.gen_range(0..pool.len())].to_string()
}

/// Numbered designation like `Starbase 417`: first digit never zero.
fn numbered(prefix: &str, rng: &mut impl Rng) -> String {
    format!(
        "{} {}{}{}",
        prefix,
        rng.gen_range(1..=9),
        rng.gen_range(0..=9),
        rng.gen_range(0..=9)
    )
}

pub fn object_name(kind: ObjectKind, rng: &mut impl Rng) -> String {
    match kind {
        ObjectKind::Star => pick(&STAR_NAMES, rng),
        ObjectKind::Planet => pick(&PLANET_NAMES, rng),
        ObjectKind::Station => numbered("Starbase", rng),
        ObjectKind::Port => numbered("Port", rng),
        ObjectKind::Ship => pick(&SHIP_NAMES, rng),
    }
}

pub fn sector_name(rng: &mut impl Rng) -> String {
    pick(&SECTOR_NAMES, rng)
}
