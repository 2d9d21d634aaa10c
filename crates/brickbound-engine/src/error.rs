use thiserror::Error;

use crate::api::types::Category;

/// Configuration-time failures. All of these abort a world load; none of them
/// can occur once the step loop is running.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("collision handler for {0:?}/{1:?} is already registered")]
    PairAlreadyRegistered(Category, Category),
}
