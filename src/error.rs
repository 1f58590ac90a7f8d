//! Typed errors for configuration, persistence, eligibility and the host API

use thiserror::Error;

/// Fatal playfield configuration problems, detected before the loop starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must have positive width and height")]
    NonPositiveSize { name: &'static str },

    #[error("target must be smaller than the viewfinder on at least one axis")]
    TargetNotSmaller,

    #[error("target ({target_w}x{target_h}) does not fit inside the viewfinder ({view_w}x{view_h})")]
    TargetTooLarge {
        target_w: f32,
        target_h: f32,
        view_w: f32,
        view_h: f32,
    },

    #[error("{name} lies outside the canvas")]
    OutOfBounds { name: &'static str },

    #[error("at least one preferred placement region is required")]
    NoPreferredRegions,

    #[error("preferred region {index} is smaller than the target")]
    RegionTooSmall { index: usize },

    #[error("fallback margin {margin} leaves no room for the target on the canvas")]
    FallbackMargin { margin: f32 },

    #[error("viewfinder speed must be positive")]
    NonPositiveSpeed,

    #[error("invalid configuration JSON: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Persistence failures. Logged by the score bridge, never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("score store unavailable")]
    Unavailable,

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("session {0} has already ended")]
    SessionEnded(String),

    #[error("store request failed with HTTP {status}")]
    Http { status: u16 },

    #[error("could not decode store response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Wallet connection and balance lookup failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EligibilityError {
    #[error("no wallet provider found")]
    NoWallet,

    #[error("wallet connection rejected: {0}")]
    Rejected(String),

    #[error("balance lookup failed: {0}")]
    Oracle(String),

    #[error("player registration failed: {0}")]
    Registration(#[from] StoreError),
}

/// Errors surfaced to the host page.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("player is not eligible to play")]
    NotEligible,

    #[error("no active game session")]
    NoActiveSession,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ConfigError::OutOfBounds { name: "jumbotron" };
        assert_eq!(err.to_string(), "jumbotron lies outside the canvas");

        let err = GameError::from(ConfigError::NoPreferredRegions);
        assert!(err.to_string().contains("preferred placement region"));
    }

    #[test]
    fn json_errors_convert() {
        let err: ConfigError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
