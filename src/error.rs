use thiserror::Error;

use crate::data::store::StoreError;
use crate::dice::DiceError;
use crate::npc::NpcError;
use crate::rules::formula::FormulaError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Dice(#[from] DiceError),

    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Npc(#[from] NpcError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
