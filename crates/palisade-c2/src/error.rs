use palisade_core::Identifier;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("router asset {0} is not in the hierarchy")]
    UnknownSender(Identifier),

    #[error("failed to parse routing configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for RouteError {
    fn from(e: serde_json::Error) -> Self {
        RouteError::Parse(e.to_string())
    }
}

pub type RouteResult<T> = Result<T, RouteError>;
