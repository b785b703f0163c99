use thiserror::Error;

#[derive(Error, Debug)]
pub enum LikeBotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Like server unreachable: {0}")]
    ApiUnavailable(#[from] reqwest::Error),

    #[error("Like server returned invalid JSON")]
    ApiInvalidJson(#[source] serde_json::Error),

    #[error("Like server response missing required fields")]
    ApiIncomplete,
}
