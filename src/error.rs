use thiserror::Error;

/// Rejection of a single marketplace operation.
///
/// Every variant maps to a stable numeric code via [`MarketError::code`];
/// external callers match on the code, so the mapping must never change.
/// A rejected operation leaves the store untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MarketError {
    #[error("caller is not authorized for this action")]
    NotAuthorized,

    #[error("required text field is empty")]
    EmptyField,

    #[error("job or bid not found")]
    NotFound,

    #[error("operation not valid for the job's current status")]
    InvalidStatus,

    #[error("marketplace is paused")]
    Paused,

    #[error("zero identity supplied")]
    ZeroIdentity,

    #[error("bid amount below minimum or above job budget")]
    InvalidBidAmount,

    #[error("bidder already has a live bid on this job")]
    DuplicateBid,

    #[error("caller is not the job's client")]
    NotClient,

    #[error("job is not open for bidding")]
    JobNotOpen,

    #[error("budget below the configured minimum")]
    BudgetTooLow,

    #[error("deadline has passed or is inconsistent")]
    DeadlinePassed,

    #[error("job can only be edited while open")]
    EditNotAllowed,

    #[error("job can only be cancelled while open or bidding")]
    CancelNotAllowed,

    #[error("job identifier must be positive")]
    InvalidJobId,

    #[error("text field exceeds maximum length")]
    TextTooLong,

    #[error("time value must be positive")]
    InvalidTime,
}

impl MarketError {
    /// Stable numeric code for this rejection.
    pub fn code(&self) -> u16 {
        match self {
            MarketError::NotAuthorized => 100,
            MarketError::EmptyField => 101,
            MarketError::NotFound => 102,
            MarketError::InvalidStatus => 103,
            MarketError::Paused => 104,
            MarketError::ZeroIdentity => 105,
            MarketError::InvalidBidAmount => 106,
            MarketError::DuplicateBid => 107,
            MarketError::NotClient => 108,
            MarketError::JobNotOpen => 109,
            MarketError::BudgetTooLow => 110,
            MarketError::DeadlinePassed => 111,
            MarketError::EditNotAllowed => 112,
            MarketError::CancelNotAllowed => 113,
            MarketError::InvalidJobId => 114,
            MarketError::TextTooLong => 115,
            MarketError::InvalidTime => 116,
        }
    }
}

pub type MarketResult<T> = std::result::Result<T, MarketError>;

/// Application-level errors for the binary: file IO, parsing, journal shape.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Journal error: {0}")]
    Journal(String),

    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
