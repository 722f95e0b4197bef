//! Asymmetric pricing and atomic cargo/credit transfers.
//!
//! A business prices each commodity off the fraction of its holds that
//! commodity occupies: deep stock sells cheap and buys dear, scarce stock
//! the reverse. Transfers validate everything up front and only then mutate,
//! so a failed trade leaves every participant untouched.

use crate::world::commodity::{self, CargoStack};
use crate::world::entity::GameObject;
use crate::world::errors::WorldError;

/// Unit prices a business quotes for one commodity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price {
    /// What the business pays per unit when it buys.
    pub buying: f64,
    /// What the business charges per unit when it sells.
    pub selling: f64,
}

/// Price a commodity at a business.
///
/// With `x` the fraction of the business's holds occupied by the commodity,
/// the variance line through (0, -0.5) and (1, +0.5) gives `y = x - 0.5`,
/// then `selling = value * (1 - y)` and `buying = value * (1 + y)`. At x=0
/// the business sells at 1.5x base and buys at 0.5x; at x=1 the reverse.
pub fn price_of(business: &GameObject, commodity_id: &str) -> Result<Price, WorldError> {
    if !business.is_business {
        return Err(WorldError::validation(format!(
            "{} does not trade",
            business.name
        )));
    }
    let commodity = commodity::by_id(commodity_id)
        .ok_or_else(|| WorldError::validation(format!("unknown commodity '{commodity_id}'")))?;
    if business.holds == 0 {
        return Err(WorldError::resource(format!(
            "{} has no holds to price against",
            business.name
        )));
    }

    let x = commodity::count_of(&business.cargo, commodity_id) as f64 / business.holds as f64;
    let y = x - 0.5;
    let value = commodity.value as f64;
    Ok(Price {
        buying: value * (1.0 + y),
        selling: value * (1.0 - y),
    })
}

/// One side of a trade: a mutable view over whoever's cargo and credits are
/// at stake. The player side spans two entities (ship cargo, user credits);
/// a port is a single object lending out both fields.
pub struct TradeParty<'a> {
    pub cargo: &'a mut Vec<CargoStack>,
    pub credits: &'a mut i64,
}

impl<'a> TradeParty<'a> {
    pub fn new(cargo: &'a mut Vec<CargoStack>, credits: &'a mut i64) -> Self {
        Self { cargo, credits }
    }
}

/// Move `quantity` units of `item` from seller to buyer at `unit_price`,
/// returning the total cost exchanged.
///
/// Validation happens before any mutation: positive quantity, seller stock,
/// buyer credits. On success the transfer commits in full; units and credits
/// are conserved across the two parties. The seller's stack may remain in
/// its cargo list at count zero.
pub fn trade(
    item: &str,
    quantity: u32,
    unit_price: f64,
    buyer: TradeParty<'_>,
    seller: TradeParty<'_>,
) -> Result<i64, WorldError> {
    if quantity == 0 {
        return Err(WorldError::validation("quantity must be a positive integer"));
    }
    commodity::by_id(item)
        .ok_or_else(|| WorldError::validation(format!("unknown commodity '{item}'")))?;

    let cost = (unit_price * quantity as f64).round() as i64;

    let seller_stack = seller
        .cargo
        .iter_mut()
        .find(|s| s.commodity == item)
        .filter(|s| s.count >= quantity)
        .ok_or_else(|| {
            WorldError::resource(format!("seller does not hold {quantity} units of {item}"))
        })?;
    if *buyer.credits < cost {
        return Err(WorldError::resource(format!(
            "buyer cannot cover {cost} credits"
        )));
    }

    // All checks passed; commit in full.
    seller_stack.count -= quantity;
    match buyer.cargo.iter_mut().find(|s| s.commodity == item) {
        Some(stack) => stack.count += quantity,
        None => buyer.cargo.push(CargoStack::new(item, quantity)),
    }
    *buyer.credits -= cost;
    *seller.credits += cost;
    Ok(cost)
}
