use hybrid_model::{Resource, SiteKey};
use thiserror::Error;

/// Errors that abort a site solve or a whole shard.
///
/// An infeasible LP is not one of them: it is reported as
/// [`SiteOutcome::Infeasible`](crate::capacity::SiteOutcome) and the shard moves on.
#[derive(Error, Debug)]
pub enum SizingError {
    #[error("{resource} profile for site {site} has {len} hours, expected at least {expected}")]
    MalformedProfile {
        site: SiteKey,
        resource: Resource,
        len: usize,
        expected: usize,
    },

    #[error("{resource} profile for site {site} has a non-finite value at hour {hour}")]
    NonFiniteProfile {
        site: SiteKey,
        resource: Resource,
        hour: usize,
    },

    #[error("{resource} profile for site {site} has negative value {value} at hour {hour}")]
    NegativeProfile {
        site: SiteKey,
        resource: Resource,
        hour: usize,
        value: f64,
    },

    #[error("no {resource} profile for site {site}")]
    MissingProfile { site: SiteKey, resource: Resource },

    #[error("shard {shard_id} is outside [0, {shard_count})")]
    PartitionBounds { shard_id: usize, shard_count: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("site {0} appears in more than one shard")]
    DuplicateSite(SiteKey),

    #[error("invalid input data: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type SizingResult<T> = Result<T, SizingError>;
