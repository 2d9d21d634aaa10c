pub mod api;
pub mod collision;
pub mod core;
pub mod entities;
pub mod error;

// Re-export key types at crate root for convenience
pub use api::snapshot::EntitySnapshot;
pub use api::types::{Category, EntityId};
pub use collision::direction::ContactSide;
pub use collision::dispatch::{DispatchTable, PairEntry};
pub use core::physics::{
    BodyDesc, BodyType, ColliderDesc, ColliderMaterial, ContactPhase, PhysicsBody, PhysicsWorld,
};
pub use core::rng::Rng;
pub use core::time::FixedTimestep;
pub use core::world::{Contact, World};
pub use entities::{
    BlockKind, Entity, EntityKind, GoalKind, GoalState, ItemKind, MobKind, MobState, MysteryState,
    PlayerState, SwitchState,
};
pub use error::EngineError;
