use thiserror::Error;

/// All failure modes of the engine, from card-notation parsing up through
/// protocol-level session mistakes. Recoverable conditions (see `Diagnostics`)
/// are not represented here — they are logged and counted rather than returned.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid rank: {0}")]
    InvalidRank(char),

    #[error("invalid suit: {0}")]
    InvalidSuit(char),

    #[error("invalid card notation: {0}")]
    InvalidCardNotation(String),

    #[error("invalid board notation: {0}")]
    InvalidBoardNotation(String),

    #[error("need at least {need} cards, got {got}")]
    NotEnoughCards { need: usize, got: usize },

    #[error("cannot deal {requested} cards, only {available} remaining")]
    NotEnoughDeck { requested: usize, available: usize },

    #[error("hand must be exactly 2 cards")]
    InvalidHandSize,

    #[error("bad action index {index}, legal range is [0, {legal_count})")]
    InvalidAction { index: usize, legal_count: usize },

    #[error("unknown session id {0}")]
    BadSession(u64),

    #[error("strategy file meta is inconsistent: {0}")]
    InvalidStrategyFile(String),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
