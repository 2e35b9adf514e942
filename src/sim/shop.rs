//! Shop economy: relics, consumables and the between-depth store
//!
//! The shop opens whenever the deepest reached row crosses a multiple of the
//! configured interval. While it is open the simulation is frozen. Every
//! rejected request leaves coins and inventory untouched and publishes a
//! `PurchaseRejected` event.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::events::GameEvent;
use super::state::{GamePhase, GameState};
use crate::tuning::ShopTuning;

/// Permanent upgrades, kept for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relic {
    /// Higher jump
    SpringBoots,
    /// Each one digs one more row beneath the first
    DrillBit,
    /// Stomping never hurts
    SteelCaps,
    /// Shorter dig cooldown
    QuickPick,
    /// Faster walking
    RunningShoes,
}

impl Relic {
    pub const ALL: [Relic; 5] = [
        Relic::SpringBoots,
        Relic::DrillBit,
        Relic::SteelCaps,
        Relic::QuickPick,
        Relic::RunningShoes,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Relic::SpringBoots => "spring-boots",
            Relic::DrillBit => "drill-bit",
            Relic::SteelCaps => "steel-caps",
            Relic::QuickPick => "quick-pick",
            Relic::RunningShoes => "running-shoes",
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            Relic::SpringBoots => 20,
            Relic::DrillBit => 30,
            Relic::SteelCaps => 25,
            Relic::QuickPick => 20,
            Relic::RunningShoes => 15,
        }
    }

    /// Whether owning more than one does anything
    pub fn stackable(&self) -> bool {
        matches!(self, Relic::DrillBit)
    }
}

/// Single-use items held in the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Consumable {
    Dynamite,
    Heart,
    Shield,
}

impl Consumable {
    pub const ALL: [Consumable; 3] = [Consumable::Dynamite, Consumable::Heart, Consumable::Shield];

    pub fn id(&self) -> &'static str {
        match self {
            Consumable::Dynamite => "dynamite",
            Consumable::Heart => "heart",
            Consumable::Shield => "shield",
        }
    }

    pub fn price(&self) -> u32 {
        match self {
            Consumable::Dynamite => 8,
            Consumable::Heart => 12,
            Consumable::Shield => 10,
        }
    }
}

/// Anything the shop can sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopItem {
    Relic(Relic),
    Consumable(Consumable),
}

impl ShopItem {
    pub fn id(&self) -> &'static str {
        match self {
            ShopItem::Relic(r) => r.id(),
            ShopItem::Consumable(c) => c.id(),
        }
    }

    /// Resolve an item id coming from the UI
    pub fn from_id(id: &str) -> Option<Self> {
        Relic::ALL
            .iter()
            .map(|r| ShopItem::Relic(*r))
            .chain(Consumable::ALL.iter().map(|c| ShopItem::Consumable(*c)))
            .find(|item| item.id() == id)
    }

    pub fn price(&self) -> u32 {
        match self {
            ShopItem::Relic(r) => r.price(),
            ShopItem::Consumable(c) => c.price(),
        }
    }
}

/// Player stat changes derived from owned relics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerModifiers {
    pub jump_multiplier: f32,
    pub speed_multiplier: f32,
    pub dig_cooldown_multiplier: f32,
    pub extra_dig_rows: u32,
    pub stomp_immune: bool,
}

impl Default for PlayerModifiers {
    fn default() -> Self {
        Self {
            jump_multiplier: 1.0,
            speed_multiplier: 1.0,
            dig_cooldown_multiplier: 1.0,
            extra_dig_rows: 0,
            stomp_immune: false,
        }
    }
}

impl PlayerModifiers {
    pub fn from_relics(relics: &[Relic]) -> Self {
        let mut mods = Self::default();
        for relic in relics {
            match relic {
                Relic::SpringBoots => mods.jump_multiplier = 1.25,
                Relic::DrillBit => mods.extra_dig_rows += 1,
                Relic::SteelCaps => mods.stomp_immune = true,
                Relic::QuickPick => mods.dig_cooldown_multiplier = 0.6,
                Relic::RunningShoes => mods.speed_multiplier = 1.25,
            }
        }
        mods
    }
}

/// Reasons a shop request is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    #[error("the shop is closed")]
    Closed,
    #[error("need {price} coins, have {balance}")]
    InsufficientCoins { price: u32, balance: u32 },
    #[error("unknown item id '{0}'")]
    UnknownItem(String),
    #[error("no offer in slot {0}")]
    NoSuchOffer(usize),
    #[error("slot {0} is sold out")]
    SoldOut(usize),
    #[error("'{0}' is not on offer")]
    NotOffered(String),
    #[error("relic '{0}' already owned")]
    AlreadyOwned(&'static str),
}

/// Store state; `None` offers have been bought
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
    pub offers: Vec<Option<ShopItem>>,
    pub reroll_cost: u32,
    /// Max depth at which the shop next opens
    pub next_threshold: u32,
}

impl Shop {
    pub fn new(tuning: &ShopTuning) -> Self {
        Self {
            offers: Vec::new(),
            reroll_cost: tuning.reroll_base_cost,
            next_threshold: tuning.interval_depth,
        }
    }

    /// Items still for sale, in slot order
    pub fn available(&self) -> Vec<ShopItem> {
        self.offers.iter().flatten().copied().collect()
    }
}

/// Pick distinct offers the player can still use
fn roll_offers(state: &mut GameState) -> Vec<Option<ShopItem>> {
    let owned = &state.stats.relics;
    let mut pool: Vec<ShopItem> = Relic::ALL
        .iter()
        .filter(|r| r.stackable() || !owned.contains(*r))
        .map(|r| ShopItem::Relic(*r))
        .chain(Consumable::ALL.iter().map(|c| ShopItem::Consumable(*c)))
        .collect();

    let count = state.tuning.shop.offer_count.min(pool.len());
    let mut offers = Vec::with_capacity(count);
    for _ in 0..count {
        let pick = state.rng.random_range(0..pool.len());
        offers.push(Some(pool.swap_remove(pick)));
    }
    offers
}

/// Open the shop if max depth has crossed the next threshold
pub fn maybe_open_shop(state: &mut GameState) -> bool {
    let interval = state.tuning.shop.interval_depth;
    if interval == 0 || state.phase != GamePhase::Playing {
        return false;
    }
    if state.stats.max_depth < state.shop.next_threshold {
        return false;
    }
    while state.shop.next_threshold <= state.stats.max_depth {
        state.shop.next_threshold += interval;
    }
    open_shop(state);
    true
}

/// Freeze the run and stock fresh offers
pub fn open_shop(state: &mut GameState) {
    state.phase = GamePhase::Shop;
    state.shop.reroll_cost = state.tuning.shop.reroll_base_cost;
    state.shop.offers = roll_offers(state);
    let depth = state.stats.max_depth;
    let offers = state.shop.available();
    log::info!("Shop opened at depth {} with {} offers", depth, offers.len());
    state.emit(GameEvent::ShopOpened { depth, offers });
}

/// Resume play. Dig input must be released before it fires again.
pub fn close_shop(state: &mut GameState) -> Result<(), ShopError> {
    if state.phase != GamePhase::Shop {
        return Err(reject(state, ShopError::Closed));
    }
    state.phase = GamePhase::Playing;
    state.shop.offers.clear();
    state.player.dig_armed = false;
    log::info!("Shop closed");
    state.emit(GameEvent::ShopClosed);
    Ok(())
}

fn reject(state: &mut GameState, err: ShopError) -> ShopError {
    log::warn!("Shop request rejected: {}", err);
    state.emit(GameEvent::PurchaseRejected {
        reason: err.to_string(),
    });
    err
}

fn check_purchase(state: &GameState, index: usize) -> Result<ShopItem, ShopError> {
    if state.phase != GamePhase::Shop {
        return Err(ShopError::Closed);
    }
    let slot = state.shop.offers.get(index).ok_or(ShopError::NoSuchOffer(index))?;
    let item = (*slot).ok_or(ShopError::SoldOut(index))?;
    if let ShopItem::Relic(relic) = item {
        if !relic.stackable() && state.stats.relics.contains(&relic) {
            return Err(ShopError::AlreadyOwned(relic.id()));
        }
    }
    let price = item.price();
    if state.stats.coins < price {
        return Err(ShopError::InsufficientCoins {
            price,
            balance: state.stats.coins,
        });
    }
    Ok(item)
}

/// Buy the offer in `index`
pub fn purchase(state: &mut GameState, index: usize) -> Result<ShopItem, ShopError> {
    let item = match check_purchase(state, index) {
        Ok(item) => item,
        Err(err) => return Err(reject(state, err)),
    };

    let price = item.price();
    state.stats.coins -= price;
    match item {
        ShopItem::Relic(relic) => state.stats.relics.push(relic),
        ShopItem::Consumable(c) => state.stats.consumables.push(c),
    }
    state.shop.offers[index] = None;
    log::info!("Bought {} for {}", item.id(), price);
    state.emit(GameEvent::PurchaseCompleted { item, price });
    state.mark_stats_dirty();
    state.flush_stats();
    Ok(item)
}

/// Buy by item id, as sent by the shop UI
pub fn purchase_by_id(state: &mut GameState, id: &str) -> Result<ShopItem, ShopError> {
    let Some(item) = ShopItem::from_id(id) else {
        return Err(reject(state, ShopError::UnknownItem(id.to_string())));
    };
    match state.shop.offers.iter().position(|o| *o == Some(item)) {
        Some(index) => purchase(state, index),
        None if state.phase != GamePhase::Shop => Err(reject(state, ShopError::Closed)),
        None => Err(reject(state, ShopError::NotOffered(id.to_string()))),
    }
}

/// Replace every offer; each reroll costs more than the last
pub fn reroll(state: &mut GameState) -> Result<(), ShopError> {
    if state.phase != GamePhase::Shop {
        return Err(reject(state, ShopError::Closed));
    }
    let cost = state.shop.reroll_cost;
    if state.stats.coins < cost {
        let err = ShopError::InsufficientCoins {
            price: cost,
            balance: state.stats.coins,
        };
        return Err(reject(state, err));
    }

    state.stats.coins -= cost;
    state.shop.reroll_cost += state.tuning.shop.reroll_cost_step;
    state.shop.offers = roll_offers(state);
    let offers = state.shop.available();
    let next_cost = state.shop.reroll_cost;
    log::debug!("Shop rerolled for {}", cost);
    state.emit(GameEvent::ShopRerolled { offers, next_cost });
    state.mark_stats_dirty();
    state.flush_stats();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop_state(coins: u32) -> GameState {
        let mut state = GameState::new(13);
        state.stats.coins = coins;
        open_shop(&mut state);
        state.events.clear();
        state
    }

    fn rejections(state: &GameState) -> usize {
        state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::PurchaseRejected { .. }))
            .count()
    }

    #[test]
    fn test_item_ids_round_trip() {
        for relic in Relic::ALL {
            assert_eq!(ShopItem::from_id(relic.id()), Some(ShopItem::Relic(relic)));
        }
        assert_eq!(
            ShopItem::from_id("heart"),
            Some(ShopItem::Consumable(Consumable::Heart))
        );
        assert_eq!(ShopItem::from_id("golden-shovel"), None);
    }

    #[test]
    fn test_modifiers_from_relics() {
        let mods = PlayerModifiers::from_relics(&[Relic::DrillBit, Relic::DrillBit, Relic::SteelCaps]);
        assert_eq!(mods.extra_dig_rows, 2);
        assert!(mods.stomp_immune);
        assert_eq!(mods.jump_multiplier, 1.0);
        assert_eq!(PlayerModifiers::from_relics(&[]), PlayerModifiers::default());
    }

    #[test]
    fn test_opens_at_interval_only() {
        let mut state = GameState::new(2);
        let interval = state.tuning.shop.interval_depth;
        state.stats.max_depth = interval - 1;
        assert!(!maybe_open_shop(&mut state));
        state.stats.max_depth = interval;
        assert!(maybe_open_shop(&mut state));
        assert_eq!(state.phase, GamePhase::Shop);
        assert_eq!(state.shop.available().len(), state.tuning.shop.offer_count);
        assert_eq!(state.shop.next_threshold, interval * 2);

        close_shop(&mut state).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(!state.player.dig_armed);
        assert!(!maybe_open_shop(&mut state));
    }

    #[test]
    fn test_offers_are_distinct() {
        let state = shop_state(0);
        let offers = state.shop.available();
        for i in 0..offers.len() {
            for j in (i + 1)..offers.len() {
                assert_ne!(offers[i], offers[j]);
            }
        }
    }

    #[test]
    fn test_purchase_deducts_and_grants() {
        let mut state = shop_state(100);
        let item = state.shop.available()[0];
        assert_eq!(purchase(&mut state, 0), Ok(item));
        assert_eq!(state.stats.coins, 100 - item.price());
        assert!(state.shop.offers[0].is_none());
        match item {
            ShopItem::Relic(r) => assert!(state.stats.relics.contains(&r)),
            ShopItem::Consumable(c) => assert!(state.stats.consumables.contains(&c)),
        }
        assert_eq!(purchase(&mut state, 0), Err(ShopError::SoldOut(0)));
        assert_eq!(rejections(&state), 1);
    }

    #[test]
    fn test_insufficient_coins_changes_nothing() {
        let mut state = shop_state(1);
        let relics = state.stats.relics.clone();
        let consumables = state.stats.consumables.clone();

        assert!(matches!(
            purchase(&mut state, 0),
            Err(ShopError::InsufficientCoins { balance: 1, .. })
        ));
        assert!(matches!(
            reroll(&mut state),
            Err(ShopError::InsufficientCoins { balance: 1, .. })
        ));

        assert_eq!(state.stats.coins, 1);
        assert_eq!(state.stats.relics, relics);
        assert_eq!(state.stats.consumables, consumables);
        assert_eq!(rejections(&state), 2);
    }

    #[test]
    fn test_purchase_by_id_rejects_unknown_and_unoffered() {
        let mut state = shop_state(500);
        assert_eq!(
            purchase_by_id(&mut state, "golden-shovel"),
            Err(ShopError::UnknownItem("golden-shovel".to_string()))
        );

        let offered = state.shop.available()[1];
        assert_eq!(purchase_by_id(&mut state, offered.id()), Ok(offered));

        let missing = Relic::ALL
            .iter()
            .map(|r| ShopItem::Relic(*r))
            .chain(Consumable::ALL.iter().map(|c| ShopItem::Consumable(*c)))
            .find(|i| !state.shop.offers.contains(&Some(*i)))
            .unwrap();
        assert_eq!(
            purchase_by_id(&mut state, missing.id()),
            Err(ShopError::NotOffered(missing.id().to_string()))
        );
        assert_eq!(rejections(&state), 2);
    }

    #[test]
    fn test_owned_relics_are_not_offered_again() {
        let mut state = GameState::new(40);
        state.stats.relics = vec![
            Relic::SpringBoots,
            Relic::SteelCaps,
            Relic::QuickPick,
            Relic::RunningShoes,
        ];
        for _ in 0..20 {
            open_shop(&mut state);
            for item in state.shop.available() {
                if let ShopItem::Relic(r) = item {
                    assert_eq!(r, Relic::DrillBit);
                }
            }
        }
    }

    #[test]
    fn test_reroll_cost_escalates() {
        let mut state = shop_state(100);
        let base = state.tuning.shop.reroll_base_cost;
        let step = state.tuning.shop.reroll_cost_step;
        reroll(&mut state).unwrap();
        reroll(&mut state).unwrap();
        assert_eq!(state.stats.coins, 100 - base - (base + step));
        assert_eq!(state.shop.reroll_cost, base + 2 * step);

        // Reopening resets the price
        close_shop(&mut state).unwrap();
        open_shop(&mut state);
        assert_eq!(state.shop.reroll_cost, base);
    }

    #[test]
    fn test_requests_while_closed_are_rejected() {
        let mut state = GameState::new(6);
        state.stats.coins = 100;
        assert_eq!(purchase(&mut state, 0), Err(ShopError::Closed));
        assert_eq!(reroll(&mut state), Err(ShopError::Closed));
        assert_eq!(close_shop(&mut state), Err(ShopError::Closed));
        assert_eq!(state.stats.coins, 100);
    }
}
