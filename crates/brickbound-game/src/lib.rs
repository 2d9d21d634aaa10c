pub mod behavior;
pub mod config;
pub mod contact;
pub mod game;
pub mod level;
pub mod scores;

pub use config::{ConfigError, Settings};
pub use contact::ContactKind;
pub use game::{HudState, Session, SessionEvent, INVINCIBILITY_SECS};
pub use level::{build_world, load_world, GameWorld, BLOCK_SIZE};
pub use scores::{ScoreBoard, ScoreEntry, MAX_HIGH_SCORES};
