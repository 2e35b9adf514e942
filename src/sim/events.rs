//! Outbound game events and a small publish/subscribe bus
//!
//! The simulation only appends to `GameState::events`; the host drains that
//! queue once per frame and hands it to an `EventBus`, which fans every event
//! out to the subscribers registered for its name. Delivery is fire-and-forget.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{DamageCause, EntityId, EntityKind};
use super::grid::TileKind;
use super::shop::{Consumable, Relic, ShopItem};

/// Why a row disappeared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearCause {
    Dig,
    Explosion,
}

/// Run statistics as published to the HUD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub lives: u32,
    pub coins: u32,
    pub depth: u32,
    pub relics: Vec<Relic>,
    pub consumables: Vec<Consumable>,
}

/// Everything the core reports to presentation, audio and scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RowCleared {
        row: i32,
        /// Prior tile types, left to right
        tiles: Vec<TileKind>,
        cause: ClearCause,
    },
    ExplosionOccurred {
        pos: Vec2,
        radius: f32,
    },
    EntityDamaged {
        id: EntityId,
        kind: EntityKind,
        cause: DamageCause,
        remaining: i32,
    },
    EntityDestroyed {
        id: EntityId,
        kind: EntityKind,
        cause: DamageCause,
        pos: Vec2,
    },
    BoulderImpact {
        id: EntityId,
        pos: Vec2,
    },
    TntFuseTick {
        id: EntityId,
        ticks_left: u32,
    },
    CoinCollected {
        value: u32,
    },
    DepthChanged {
        depth: u32,
    },
    StatsChanged(StatsSnapshot),
    ShopOpened {
        depth: u32,
        offers: Vec<ShopItem>,
    },
    ShopRerolled {
        offers: Vec<ShopItem>,
        next_cost: u32,
    },
    ShopClosed,
    PurchaseCompleted {
        item: ShopItem,
        price: u32,
    },
    PurchaseRejected {
        reason: String,
    },
    GameOver {
        final_depth: u32,
        total_coins: u32,
        relics: Vec<Relic>,
    },
}

/// Event names subscribers can filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    RowCleared,
    ExplosionOccurred,
    EntityDamaged,
    EntityDestroyed,
    BoulderImpact,
    TntFuseTick,
    CoinCollected,
    DepthChanged,
    StatsChanged,
    ShopOpened,
    ShopRerolled,
    ShopClosed,
    PurchaseCompleted,
    PurchaseRejected,
    GameOver,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RowCleared => "row-cleared",
            EventKind::ExplosionOccurred => "explosion-occurred",
            EventKind::EntityDamaged => "entity-damaged",
            EventKind::EntityDestroyed => "entity-destroyed",
            EventKind::BoulderImpact => "boulder-impact",
            EventKind::TntFuseTick => "tnt-fuse-tick",
            EventKind::CoinCollected => "coin-collected",
            EventKind::DepthChanged => "depth-changed",
            EventKind::StatsChanged => "stats-changed",
            EventKind::ShopOpened => "shop-opened",
            EventKind::ShopRerolled => "shop-rerolled",
            EventKind::ShopClosed => "shop-closed",
            EventKind::PurchaseCompleted => "purchase-completed",
            EventKind::PurchaseRejected => "purchase-rejected",
            EventKind::GameOver => "game-over",
        }
    }
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::RowCleared { .. } => EventKind::RowCleared,
            GameEvent::ExplosionOccurred { .. } => EventKind::ExplosionOccurred,
            GameEvent::EntityDamaged { .. } => EventKind::EntityDamaged,
            GameEvent::EntityDestroyed { .. } => EventKind::EntityDestroyed,
            GameEvent::BoulderImpact { .. } => EventKind::BoulderImpact,
            GameEvent::TntFuseTick { .. } => EventKind::TntFuseTick,
            GameEvent::CoinCollected { .. } => EventKind::CoinCollected,
            GameEvent::DepthChanged { .. } => EventKind::DepthChanged,
            GameEvent::StatsChanged(_) => EventKind::StatsChanged,
            GameEvent::ShopOpened { .. } => EventKind::ShopOpened,
            GameEvent::ShopRerolled { .. } => EventKind::ShopRerolled,
            GameEvent::ShopClosed => EventKind::ShopClosed,
            GameEvent::PurchaseCompleted { .. } => EventKind::PurchaseCompleted,
            GameEvent::PurchaseRejected { .. } => EventKind::PurchaseRejected,
            GameEvent::GameOver { .. } => EventKind::GameOver,
        }
    }

    /// Event name on the bus
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

type Handler = Box<dyn FnMut(&GameEvent)>;

struct Subscriber {
    filter: Option<EventKind>,
    handler: Handler,
}

/// Multi-subscriber fan-out for drained events
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive one event kind
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F)
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.subscribers.push(Subscriber {
            filter: Some(kind),
            handler: Box::new(handler),
        });
    }

    /// Receive every event
    pub fn subscribe_all<F>(&mut self, handler: F)
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.subscribers.push(Subscriber {
            filter: None,
            handler: Box::new(handler),
        });
    }

    pub fn publish(&mut self, event: &GameEvent) {
        let kind = event.kind();
        for sub in &mut self.subscribers {
            if sub.filter.is_none_or(|f| f == kind) {
                (sub.handler)(event);
            }
        }
    }

    /// Deliver a drained batch in order
    pub fn publish_all<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = GameEvent>,
    {
        for event in events {
            self.publish(&event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
