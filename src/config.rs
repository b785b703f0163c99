use crate::error::LikeBotError;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub like_api_url: String,
    pub like_api_timeout_ms: u64,
    pub admin_ids: Vec<i64>,
    pub allowed_groups: Vec<i64>,
    pub vip_users: Vec<i64>,
    pub default_daily_limit: u32,
    pub reset_hour: u32,
    pub reset_minute: u32,
    pub keepalive_port: u16,
}

fn parse_id_list(raw: Option<String>) -> Vec<i64> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.split(',')
                .filter_map(|id| id.trim().parse::<i64>().ok())
                .collect()
        })
        .unwrap_or_default()
}

pub fn load_config() -> Result<Config, LikeBotError> {
    dotenvy::dotenv().ok();

    let telegram_token = std::env::var("TELEGRAM_BOT_TOKEN")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    if telegram_token.is_empty() {
        return Err(LikeBotError::Config(
            "TELEGRAM_BOT_TOKEN is required. Set it in .env file.".into(),
        ));
    }

    let like_api_url = std::env::var("LIKE_API_URL")
        .ok()
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "https://295.vercel.app/like".to_string());

    let like_api_timeout_ms = std::env::var("LIKE_API_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(10_000);

    let admin_ids = parse_id_list(std::env::var("ADMIN_IDS").ok());
    let allowed_groups = parse_id_list(std::env::var("ALLOWED_GROUPS").ok());
    let vip_users = parse_id_list(std::env::var("VIP_USERS").ok());

    let default_daily_limit = std::env::var("DEFAULT_DAILY_LIMIT")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(30);

    let reset_hour = std::env::var("RESET_HOUR")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|h| *h < 24)
        .unwrap_or(0);

    let reset_minute = std::env::var("RESET_MINUTE")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .filter(|m| *m < 60)
        .unwrap_or(0);

    // Hosting platforms inject PORT for the liveness probe listener.
    let keepalive_port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(8080);

    Ok(Config {
        telegram_token,
        like_api_url,
        like_api_timeout_ms,
        admin_ids,
        allowed_groups,
        vip_users,
        default_daily_limit,
        reset_hour,
        reset_minute,
        keepalive_port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_list_basic() {
        let ids = parse_id_list(Some("123, 456 ,789".to_string()));
        assert_eq!(ids, vec![123, 456, 789]);
    }

    #[test]
    fn test_parse_id_list_skips_garbage() {
        let ids = parse_id_list(Some("123,abc,,456".to_string()));
        assert_eq!(ids, vec![123, 456]);
    }

    #[test]
    fn test_parse_id_list_empty() {
        assert!(parse_id_list(None).is_empty());
        assert!(parse_id_list(Some("   ".to_string())).is_empty());
    }

    #[test]
    fn test_parse_id_list_negative_group_ids() {
        let ids = parse_id_list(Some("-1003161051720".to_string()));
        assert_eq!(ids, vec![-1003161051720]);
    }

    #[test]
    fn test_load_config_missing_token() {
        // Clear the token to test missing token error
        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        let result = load_config();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }
}
