//! Item subtype state. Items are collectible: contact with the player removes
//! them from the world and converts into a player-state mutation. Their
//! colliders are sensors, so contacts are always logical-only.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Generic dropped item with no pickup effect of its own.
    Dropped,
    /// Worth one point.
    Coin,
    /// Grants a 10 second invincibility window.
    Star,
}
