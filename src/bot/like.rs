use chrono::Utc;
use teloxide::prelude::*;

use super::util::{edit_html_or_plain, is_group, sender_id};
use super::AppState;
use crate::error::LikeBotError;
use crate::like_api::{LikeGrant, LikeOutcome};
use crate::quota::Reservation;

pub async fn handle_like(
    bot: Bot,
    msg: Message,
    state: AppState,
    args: &str,
) -> anyhow::Result<()> {
    if !is_group(&msg) {
        bot.send_message(msg.chat.id, "This command only works in groups.")
            .await?;
        return Ok(());
    }

    let group_id = msg.chat.id.0;
    if !state.access.lock().await.is_allowed_group(group_id) {
        // Stay silent in groups the bot was never invited to serve
        return Ok(());
    }

    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };

    // Arguments are validated before any quota is touched, so a malformed
    // request never costs the group a unit.
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() != 2 {
        send_usage(&bot, &msg).await?;
        return Ok(());
    }
    let (region, uid) = (parts[0], parts[1]);

    let is_vip = state.access.lock().await.is_vip(user_id);
    let user_slot = if is_vip { None } else { Some(user_id) };
    let today = Utc::now().date_naive();

    // One atomic step: group unit plus (for non-VIPs) the user's daily slot.
    // Released on every failure path below, so net consumption happens only
    // on a confirmed grant.
    match state.quotas.lock().await.reserve(group_id, user_slot, today) {
        Reservation::GroupLimitReached => {
            bot.send_message(msg.chat.id, "\u{274c} Group daily like limit reached!")
                .await?;
            return Ok(());
        }
        Reservation::UserAlreadyUsed => {
            bot.send_message(
                msg.chat.id,
                "\u{26d4} You have already used your free like for today.",
            )
            .await?;
            return Ok(());
        }
        Reservation::Reserved => {}
    }

    let processing = bot
        .send_message(msg.chat.id, "\u{23f3} Processing your request...")
        .await?;

    match state.like_client.send_like(region, uid).await {
        Ok(LikeOutcome::Granted(grant)) => {
            let promo = state.access.lock().await.promotion_message.clone();
            let text = format_grant_reply(&grant, region, &promo);
            edit_html_or_plain(&bot, msg.chat.id, processing.id, &text).await?;
        }
        Ok(LikeOutcome::AlreadyMaxed) => {
            state.quotas.lock().await.release(group_id, user_slot);
            bot.edit_message_text(
                msg.chat.id,
                processing.id,
                "\u{26a0}\u{fe0f} This UID has already reached the maximum likes for today from the server.",
            )
            .await?;
        }
        Err(e @ LikeBotError::ApiUnavailable(_)) => {
            state.quotas.lock().await.release(group_id, user_slot);
            tracing::error!("like request for uid {uid} failed: {e}");
            bot.edit_message_text(
                msg.chat.id,
                processing.id,
                "\u{1f6a8} API Error! The like server might be down. Please try again later.",
            )
            .await?;
        }
        Err(e @ LikeBotError::ApiInvalidJson(_)) => {
            state.quotas.lock().await.release(group_id, user_slot);
            tracing::error!("like request for uid {uid} failed: {e}");
            bot.edit_message_text(
                msg.chat.id,
                processing.id,
                "\u{1f6a8} API Error! Received an invalid response from the server.",
            )
            .await?;
        }
        Err(e) => {
            state.quotas.lock().await.release(group_id, user_slot);
            tracing::warn!("like request for uid {uid} rejected: {e}");
            bot.edit_message_text(
                msg.chat.id,
                processing.id,
                "\u{26a0}\u{fe0f} Invalid UID or the region might be wrong. Please check and try again.",
            )
            .await?;
        }
    }

    Ok(())
}

async fn send_usage(bot: &Bot, msg: &Message) -> anyhow::Result<()> {
    super::util::send_html_or_plain(
        bot,
        msg.chat.id,
        "\u{26a0}\u{fe0f} Usage: `/like <region> <uid>`\nExample: `/like ind 1234567890`",
    )
    .await
}

fn format_grant_reply(grant: &LikeGrant, requested_region: &str, promo: &str) -> String {
    let mut text = format!(
        "\u{2705} **Like Sent Successfully!**\n\n\
        \u{1f464} **Name:** `{}`\n\
        \u{1f194} **UID:** `{}`\n\
        \u{1f4ca} **Level:** {}\n\
        \u{1f30d} **Region:** {}\n\
        \u{1f44d} **Before:** {}\n\
        \u{1f4c8} **After:** {}\n\
        \u{1f389} **Likes Given:** **{}**",
        grant.player_nickname,
        grant.uid,
        grant.level.as_deref().unwrap_or("N/A"),
        grant
            .region
            .clone()
            .unwrap_or_else(|| requested_region.to_uppercase()),
        grant.likes_before,
        grant.likes_after,
        grant.likes_given,
    );
    if !promo.is_empty() {
        text.push_str(&format!("\n\n\u{1f4e2} {promo}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant() -> LikeGrant {
        LikeGrant {
            player_nickname: "Shadow".to_string(),
            uid: "1234567890".to_string(),
            likes_before: 100,
            likes_after: 200,
            likes_given: 100,
            level: Some("62".to_string()),
            region: Some("IND".to_string()),
        }
    }

    #[test]
    fn test_grant_reply_contains_counts() {
        let text = format_grant_reply(&grant(), "ind", "");
        assert!(text.contains("`Shadow`"));
        assert!(text.contains("`1234567890`"));
        assert!(text.contains("**Before:** 100"));
        assert!(text.contains("**After:** 200"));
        assert!(text.contains("**Likes Given:** **100**"));
        assert!(!text.contains('\u{1f4e2}'));
    }

    #[test]
    fn test_grant_reply_appends_promotion() {
        let text = format_grant_reply(&grant(), "ind", "Join @channel");
        assert!(text.ends_with("\u{1f4e2} Join @channel"));
    }

    #[test]
    fn test_grant_reply_falls_back_to_requested_region() {
        let mut g = grant();
        g.region = None;
        g.level = None;
        let text = format_grant_reply(&g, "ind", "");
        assert!(text.contains("**Region:** IND"));
        assert!(text.contains("**Level:** N/A"));
    }
}
