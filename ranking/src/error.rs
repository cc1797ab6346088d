use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankError>;

/// Failures surfaced by the ranking core. Numeric edge cases (zero df, zero
/// tf, flat score lists, empty rankings) are never reported here.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("ensemble needs one weight per index: got {weights} weights for {indexes} indexes")]
    WeightCountMismatch { weights: usize, indexes: usize },

    #[error("ensemble classification needs at least one index")]
    NoIndexes,

    #[error("k must be strictly positive")]
    ZeroK,

    #[error("unrecognized scoring model identifier {0:?}")]
    UnknownModel(String),

    #[error("model {model} has no parameter named {name:?}")]
    UnknownParameter { model: &'static str, name: String },

    #[error("model {model} takes {expected} parameters, got {found}")]
    ParamCount { model: &'static str, expected: usize, found: usize },

    #[error("parameter {name} must be finite, got {value}")]
    InvalidParameter { name: String, value: f64 },

    #[error("invalid parameter grid: {0}")]
    InvalidGrid(String),

    #[error("cannot build corpus statistics from an empty document set")]
    EmptyCorpus,

    #[error("malformed parameter stream: {0}")]
    MalformedParams(String),

    #[error("query {0} has no relevance judgments")]
    MissingJudgments(u32),

    #[error("qrels line {line}: {reason}")]
    Qrels { line: usize, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
