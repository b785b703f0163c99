use std::time::Duration;

use serde_json::Value;

use crate::error::LikeBotError;

/// A successful, non-empty grant from the like server.
#[derive(Debug, Clone)]
pub struct LikeGrant {
    pub player_nickname: String,
    pub uid: String,
    pub likes_before: u64,
    pub likes_after: u64,
    pub likes_given: u64,
    pub level: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub enum LikeOutcome {
    Granted(LikeGrant),
    /// The server accepted the UID but could not add likes today
    /// (`LikesGivenByAPI == 0`). A valid zero-result, not an error.
    AlreadyMaxed,
}

#[derive(Clone)]
pub struct LikeClient {
    http: reqwest::Client,
    base_url: String,
}

impl LikeClient {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// One attempt, no retries. Timeouts and HTTP error statuses surface as
    /// `ApiUnavailable`.
    pub async fn send_like(&self, region: &str, uid: &str) -> Result<LikeOutcome, LikeBotError> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("uid", uid), ("server_name", region)])
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        match parse_like_response(&body) {
            Ok(outcome) => {
                tracing::info!(uid, body = body.as_str(), "like API response");
                Ok(outcome)
            }
            Err(e) => {
                // Keep the raw payload around for diagnosis
                tracing::warn!(uid, body = body.as_str(), "unusable like API response");
                Err(e)
            }
        }
    }
}

// The upstream API is loose about types: UIDs and counters arrive as numbers
// or strings depending on the deployment.
fn take_string(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn take_u64(data: &Value, key: &str) -> Option<u64> {
    match data.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn parse_like_response(body: &str) -> Result<LikeOutcome, LikeBotError> {
    let data: Value = serde_json::from_str(body).map_err(LikeBotError::ApiInvalidJson)?;

    // Zero-grant sentinel comes before the completeness check: the server
    // omits some fields on a maxed-out UID.
    if take_u64(&data, "LikesGivenByAPI") == Some(0) {
        return Ok(LikeOutcome::AlreadyMaxed);
    }

    let grant = LikeGrant {
        player_nickname: take_string(&data, "PlayerNickname").ok_or(LikeBotError::ApiIncomplete)?,
        uid: take_string(&data, "UID").ok_or(LikeBotError::ApiIncomplete)?,
        likes_before: take_u64(&data, "LikesbeforeCommand").ok_or(LikeBotError::ApiIncomplete)?,
        likes_after: take_u64(&data, "LikesafterCommand").ok_or(LikeBotError::ApiIncomplete)?,
        likes_given: take_u64(&data, "LikesGivenByAPI").ok_or(LikeBotError::ApiIncomplete)?,
        level: take_string(&data, "Level"),
        region: take_string(&data, "Region"),
    };
    Ok(LikeOutcome::Granted(grant))
}
