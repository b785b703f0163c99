use std::collections::HashSet;

use chrono::Utc;
use teloxide::prelude::*;

use super::util::{is_group, send_html_or_plain, sender_id};
use super::AppState;

/// Admin guard, returning the caller id or replying "not authorized" and
/// yielding None.
pub async fn require_admin(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<Option<i64>> {
    let Some(user_id) = sender_id(msg) else {
        return Ok(None);
    };
    if state.access.lock().await.is_admin(user_id) {
        return Ok(Some(user_id));
    }
    bot.send_message(msg.chat.id, "\u{26d4} You are not authorized.")
        .await?;
    Ok(None)
}

async fn require_admin_or_vip(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<Option<i64>> {
    let Some(user_id) = sender_id(msg) else {
        return Ok(None);
    };
    {
        let access = state.access.lock().await;
        if access.is_admin(user_id) || access.is_vip(user_id) {
            return Ok(Some(user_id));
        }
    }
    bot.send_message(msg.chat.id, "\u{26d4} You are not authorized.")
        .await?;
    Ok(None)
}

async fn parse_id_arg(bot: &Bot, msg: &Message, arg: &str, usage: &str) -> anyhow::Result<Option<i64>> {
    match arg.trim().parse::<i64>() {
        Ok(id) => Ok(Some(id)),
        Err(_) => {
            send_html_or_plain(bot, msg.chat.id, usage).await?;
            Ok(None)
        }
    }
}

pub async fn handle_switch(
    bot: Bot,
    msg: Message,
    state: AppState,
    enable: bool,
) -> anyhow::Result<()> {
    if require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    state.access.lock().await.commands_enabled = enable;
    let reply = if enable {
        "\u{2705} Commands are now enabled."
    } else {
        "\u{26d4} All commands (except /on) have been disabled."
    };
    tracing::info!(enabled = enable, "command switch changed");
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_set_limit(
    bot: Bot,
    msg: Message,
    state: AppState,
    arg: &str,
) -> anyhow::Result<()> {
    if require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    if !is_group(&msg) {
        bot.send_message(msg.chat.id, "This command only works in groups.")
            .await?;
        return Ok(());
    }
    let limit: u32 = match arg.trim().parse() {
        Ok(n) if n > 0 => n,
        _ => {
            send_html_or_plain(&bot, msg.chat.id, "\u{26a0}\u{fe0f} Usage: `/setlimit <number>`")
                .await?;
            return Ok(());
        }
    };
    let today = Utc::now().date_naive();
    state
        .quotas
        .lock()
        .await
        .set_group_limit(msg.chat.id.0, limit, today);
    bot.send_message(
        msg.chat.id,
        format!("\u{2705} Daily like limit for this group set to {limit}."),
    )
    .await?;
    Ok(())
}

pub async fn handle_allow_group(
    bot: Bot,
    msg: Message,
    state: AppState,
    arg: &str,
) -> anyhow::Result<()> {
    if require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let Some(group_id) =
        parse_id_arg(&bot, &msg, arg, "\u{26a0}\u{fe0f} Usage: `/allow <group_id>`").await?
    else {
        return Ok(());
    };
    let added = state.access.lock().await.allow_group(group_id);
    let reply = if added {
        format!("\u{2705} Group {group_id} is now allowed.")
    } else {
        format!("Group {group_id} was already allowed.")
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_remove_group(
    bot: Bot,
    msg: Message,
    state: AppState,
    arg: &str,
) -> anyhow::Result<()> {
    if require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let Some(group_id) =
        parse_id_arg(&bot, &msg, arg, "\u{26a0}\u{fe0f} Usage: `/remove <group_id>`").await?
    else {
        return Ok(());
    };
    let removed = state.access.lock().await.remove_group(group_id);
    if removed {
        // Usage history goes with the membership
        state.quotas.lock().await.forget_group(group_id);
        bot.send_message(msg.chat.id, format!("\u{2705} Group {group_id} removed."))
            .await?;
    } else {
        bot.send_message(msg.chat.id, format!("Group {group_id} was not allowed."))
            .await?;
    }
    Ok(())
}

pub async fn handle_group_reset(bot: Bot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let today = Utc::now().date_naive();
    state.quotas.lock().await.reset_all_groups(today);
    tracing::info!("group usage reset manually");
    bot.send_message(msg.chat.id, "\u{2705} Usage counters for all groups have been reset.")
        .await?;
    Ok(())
}

pub async fn handle_set_admin(
    bot: Bot,
    msg: Message,
    state: AppState,
    arg: &str,
) -> anyhow::Result<()> {
    if require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let Some(user_id) =
        parse_id_arg(&bot, &msg, arg, "\u{26a0}\u{fe0f} Usage: `/setadmin <user_id>`").await?
    else {
        return Ok(());
    };
    let added = state.access.lock().await.add_admin(user_id);
    let reply = if added {
        format!("\u{2705} User {user_id} is now an admin.")
    } else {
        format!("User {user_id} was already an admin.")
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_remove_admin(
    bot: Bot,
    msg: Message,
    state: AppState,
    arg: &str,
) -> anyhow::Result<()> {
    if require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let Some(user_id) =
        parse_id_arg(&bot, &msg, arg, "\u{26a0}\u{fe0f} Usage: `/removeadmin <user_id>`").await?
    else {
        return Ok(());
    };
    let removed = state.access.lock().await.remove_admin(user_id);
    let reply = if removed {
        format!("\u{2705} User {user_id} is no longer an admin.")
    } else {
        format!("User {user_id} was not an admin.")
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_admin_list(bot: Bot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let mut ids = state.access.lock().await.admin_ids();
    ids.sort_unstable();
    send_html_or_plain(&bot, msg.chat.id, &format_id_list("Admins", &ids)).await
}

pub async fn handle_set_vip(
    bot: Bot,
    msg: Message,
    state: AppState,
    arg: &str,
) -> anyhow::Result<()> {
    if require_admin_or_vip(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let Some(user_id) =
        parse_id_arg(&bot, &msg, arg, "\u{26a0}\u{fe0f} Usage: `/setvip <user_id>`").await?
    else {
        return Ok(());
    };
    let added = state.access.lock().await.add_vip(user_id);
    let reply = if added {
        format!("\u{2705} User {user_id} is now a VIP.")
    } else {
        format!("User {user_id} was already a VIP.")
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_remove_vip(
    bot: Bot,
    msg: Message,
    state: AppState,
    arg: &str,
) -> anyhow::Result<()> {
    if require_admin_or_vip(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let Some(user_id) =
        parse_id_arg(&bot, &msg, arg, "\u{26a0}\u{fe0f} Usage: `/removevip <user_id>`").await?
    else {
        return Ok(());
    };
    let removed = state.access.lock().await.remove_vip(user_id);
    let reply = if removed {
        format!("\u{2705} User {user_id} is no longer a VIP.")
    } else {
        format!("User {user_id} was not a VIP.")
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_vip_list(bot: Bot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if require_admin_or_vip(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let mut ids = state.access.lock().await.vip_ids();
    ids.sort_unstable();
    send_html_or_plain(&bot, msg.chat.id, &format_id_list("VIP users", &ids)).await
}

pub async fn handle_set_promotion(
    bot: Bot,
    msg: Message,
    state: AppState,
    text: &str,
) -> anyhow::Result<()> {
    if require_admin_or_vip(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let text = text.trim();
    state.access.lock().await.promotion_message = text.to_string();
    let reply = if text.is_empty() {
        "\u{2705} Promotion message cleared.".to_string()
    } else {
        format!("\u{2705} Promotion message set:\n{text}")
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

pub async fn handle_broadcast(
    bot: Bot,
    msg: Message,
    state: AppState,
    text: &str,
) -> anyhow::Result<()> {
    if require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let text = text.trim();
    if text.is_empty() {
        send_html_or_plain(&bot, msg.chat.id, "\u{26a0}\u{fe0f} Usage: `/broadcast <message>`")
            .await?;
        return Ok(());
    }

    let mut recipients: HashSet<i64> = state
        .quotas
        .lock()
        .await
        .known_user_ids()
        .into_iter()
        .collect();
    recipients.extend(state.access.lock().await.allowed_group_ids());

    let (sent, failed) = fan_out(&bot, recipients, text).await;
    bot.send_message(
        msg.chat.id,
        format!("\u{1f4e2} Broadcast done. Sent: {sent}, failed: {failed}."),
    )
    .await?;
    Ok(())
}

pub async fn handle_send_privileged(
    bot: Bot,
    msg: Message,
    state: AppState,
    text: &str,
) -> anyhow::Result<()> {
    if require_admin_or_vip(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    let text = text.trim();
    if text.is_empty() {
        send_html_or_plain(&bot, msg.chat.id, "\u{26a0}\u{fe0f} Usage: `/send <message>`").await?;
        return Ok(());
    }

    let recipients: HashSet<i64> = {
        let access = state.access.lock().await;
        access
            .vip_ids()
            .into_iter()
            .chain(access.allowed_group_ids())
            .collect()
    };

    let (sent, failed) = fan_out(&bot, recipients, text).await;
    bot.send_message(
        msg.chat.id,
        format!("\u{1f4e2} Message delivered. Sent: {sent}, failed: {failed}."),
    )
    .await?;
    Ok(())
}

/// One recipient failing (blocked the bot, left the group) must not abort
/// the rest of the fan-out.
async fn fan_out(bot: &Bot, recipients: HashSet<i64>, text: &str) -> (usize, usize) {
    let mut sent = 0;
    let mut failed = 0;
    for id in recipients {
        match send_html_or_plain(bot, ChatId(id), text).await {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!("broadcast to {id} failed: {e}");
            }
        }
    }
    (sent, failed)
}

fn format_id_list(label: &str, ids: &[i64]) -> String {
    if ids.is_empty() {
        return format!("No {} configured.", label.to_lowercase());
    }
    let mut text = format!("**{label}:**");
    for id in ids {
        text.push_str(&format!("\n- `{id}`"));
    }
    text
}
