use chrono::Utc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use super::util::{is_group, send_html_or_plain, sender_id};
use super::AppState;
use crate::access::gate_allows;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum BotCommand {
    #[command(description = "Welcome & quick start")]
    Start,
    #[command(description = "Show all commands")]
    Help,
    #[command(description = "Admin menu")]
    Open,
    #[command(description = "Send likes: /like <region> <uid>")]
    Like(String),
    #[command(description = "Your daily like status")]
    Check,
    #[command(description = "Group usage today")]
    GroupStatus,
    #[command(description = "Users served today")]
    Remain,
    #[command(description = "Bot status")]
    Status,
    #[command(description = "Enable all commands")]
    On,
    #[command(description = "Disable all commands")]
    Off,
    #[command(description = "Set this group's daily limit")]
    SetLimit(String),
    #[command(description = "Allow a group")]
    Allow(String),
    #[command(description = "Remove a group")]
    Remove(String),
    #[command(description = "Reset all group counters now")]
    GroupReset,
    #[command(description = "Add an admin")]
    SetAdmin(String),
    #[command(description = "Remove an admin")]
    RemoveAdmin(String),
    #[command(description = "List admins")]
    AdminList,
    #[command(description = "Add a VIP")]
    SetVip(String),
    #[command(description = "Remove a VIP")]
    RemoveVip(String),
    #[command(description = "List VIPs")]
    VipList,
    #[command(description = "Set the promotion line")]
    SetPromotion(String),
    #[command(description = "Broadcast to all users & groups")]
    Broadcast(String),
    #[command(description = "Message VIPs & groups")]
    Send(String),
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: BotCommand,
    state: AppState,
) -> anyhow::Result<()> {
    // Global kill switch. /on must stay reachable so an admin can recover;
    // it is the single exception, checked here rather than in its handler.
    let enabled = state.access.lock().await.commands_enabled;
    if !gate_allows(enabled, matches!(cmd, BotCommand::On)) {
        bot.send_message(msg.chat.id, "\u{1f6ab} Commands are currently disabled.")
            .await?;
        return Ok(());
    }

    match cmd {
        BotCommand::Start => handle_start(bot, msg).await,
        BotCommand::Help => handle_help(bot, msg).await,
        BotCommand::Open => handle_open(bot, msg, state).await,
        BotCommand::Like(args) => super::like::handle_like(bot, msg, state, &args).await,
        BotCommand::Check => handle_check(bot, msg, state).await,
        BotCommand::GroupStatus => handle_group_status(bot, msg, state).await,
        BotCommand::Remain => handle_remain(bot, msg, state).await,
        BotCommand::Status => handle_status(bot, msg, state).await,
        BotCommand::On => super::admin::handle_switch(bot, msg, state, true).await,
        BotCommand::Off => super::admin::handle_switch(bot, msg, state, false).await,
        BotCommand::SetLimit(arg) => super::admin::handle_set_limit(bot, msg, state, &arg).await,
        BotCommand::Allow(arg) => super::admin::handle_allow_group(bot, msg, state, &arg).await,
        BotCommand::Remove(arg) => super::admin::handle_remove_group(bot, msg, state, &arg).await,
        BotCommand::GroupReset => super::admin::handle_group_reset(bot, msg, state).await,
        BotCommand::SetAdmin(arg) => super::admin::handle_set_admin(bot, msg, state, &arg).await,
        BotCommand::RemoveAdmin(arg) => {
            super::admin::handle_remove_admin(bot, msg, state, &arg).await
        }
        BotCommand::AdminList => super::admin::handle_admin_list(bot, msg, state).await,
        BotCommand::SetVip(arg) => super::admin::handle_set_vip(bot, msg, state, &arg).await,
        BotCommand::RemoveVip(arg) => super::admin::handle_remove_vip(bot, msg, state, &arg).await,
        BotCommand::VipList => super::admin::handle_vip_list(bot, msg, state).await,
        BotCommand::SetPromotion(text) => {
            super::admin::handle_set_promotion(bot, msg, state, &text).await
        }
        BotCommand::Broadcast(text) => super::admin::handle_broadcast(bot, msg, state, &text).await,
        BotCommand::Send(text) => super::admin::handle_send_privileged(bot, msg, state, &text).await,
    }
}

async fn handle_start(bot: Bot, msg: Message) -> anyhow::Result<()> {
    bot.send_message(
        msg.chat.id,
        "\u{1f44b} Welcome! Use /like <region> <uid> to send likes.\nType /help for all commands.",
    )
    .await?;
    Ok(())
}

async fn handle_help(bot: Bot, msg: Message) -> anyhow::Result<()> {
    send_html_or_plain(
        &bot,
        msg.chat.id,
        "\u{1f4d8} **HELP MENU**\n\n\
        \u{1f539} **Core Commands:**\n\
        `/like <region> <uid>` - Send likes (e.g., `/like ind 12345678`)\n\
        `/check` - Check your daily usage status.\n\
        `/groupstatus` - See the group's daily usage.\n\
        `/remain` - See how many users have used the bot today.\n\n\
        \u{1f539} **VIP Management:** (Admin/VIP only)\n\
        `/setvip <user_id>` - Add a VIP user.\n\
        `/removevip <user_id>` - Remove a VIP.\n\
        `/viplist` - Show all VIP users.\n\
        `/setpromotion <text>` - Set a promotional message.\n\n\
        \u{1f539} **System:**\n\
        `/status` - Check the bot's overall status.\n\
        `/open` - Admin menu. (Admin only)",
    )
    .await
}

async fn handle_open(bot: Bot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if super::admin::require_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }
    send_html_or_plain(
        &bot,
        msg.chat.id,
        "\u{1f510} **ADMIN MENU**\n\n\
        \u{1f539} **Admin Tools:**\n\
        `/allow <group_id>` - Allow a group to use the bot.\n\
        `/remove <group_id>` - Remove a group.\n\
        `/setlimit <number>` - Set the daily like limit for this group.\n\
        `/groupreset` - Manually reset usage for all groups.\n\
        `/broadcast <message>` - Send a message to all users and groups.\n\
        `/send <message>` - Send a message to VIPs & groups.\n\
        `/setadmin <user_id>` - Add a new admin.\n\
        `/removeadmin <user_id>` - Remove an admin.\n\
        `/adminlist` - Show all admins.\n\
        `/on` / `/off` - Enable or disable all commands.",
    )
    .await
}

async fn handle_check(bot: Bot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user_id) = sender_id(&msg) else {
        return Ok(());
    };
    let first_name = msg
        .from
        .as_ref()
        .map(|user| user.first_name.clone())
        .unwrap_or_else(|| "user".to_string());

    let today = Utc::now().date_naive();
    let status = if state.access.lock().await.is_vip(user_id) {
        "UNLIMITED (VIP)".to_string()
    } else {
        let used = state.quotas.lock().await.user_usage(user_id, today);
        if used >= 1 {
            format!("{used}/1 \u{2705} Used")
        } else {
            "0/1 \u{274c} Not Used".to_string()
        }
    };

    send_html_or_plain(
        &bot,
        msg.chat.id,
        &format!("\u{1f464} Dear {first_name},\nYour daily like status: **{status}**"),
    )
    .await
}

async fn handle_group_status(bot: Bot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if !is_group(&msg) {
        return Ok(());
    }
    let today = Utc::now().date_naive();
    let (used, limit) = state
        .quotas
        .lock()
        .await
        .group_status(msg.chat.id.0, today);
    send_html_or_plain(
        &bot,
        msg.chat.id,
        &format!("\u{1f4ca} **Group Usage Status**\n\nLikes used today: **{used}/{limit}**"),
    )
    .await
}

async fn handle_remain(bot: Bot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let count = state.quotas.lock().await.users_used_today(today);
    bot.send_message(
        msg.chat.id,
        format!("\u{1f4ca} {count} user(s) have used the bot today."),
    )
    .await?;
    Ok(())
}

async fn handle_status(bot: Bot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let (enabled, groups, vips, admins) = {
        let access = state.access.lock().await;
        (
            access.commands_enabled,
            access.allowed_group_ids().len(),
            access.vip_ids().len(),
            access.admin_ids().len(),
        )
    };
    let known_users = state.quotas.lock().await.known_user_ids().len();

    bot.send_message(
        msg.chat.id,
        format!(
            "Status:\n\
            - Commands: {}\n\
            - Allowed groups: {groups}\n\
            - Admins: {admins}\n\
            - VIPs: {vips}\n\
            - Known users: {known_users}",
            if enabled { "enabled" } else { "disabled" },
        ),
    )
    .await?;
    Ok(())
}
