pub mod admin;
pub mod commands;
pub mod like;
pub mod util;

use std::sync::Arc;

use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;

use crate::access::AccessControl;
use crate::config::Config;
use crate::like_api::LikeClient;
use crate::quota::QuotaStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub quotas: Arc<tokio::sync::Mutex<QuotaStore>>,
    pub access: Arc<tokio::sync::Mutex<AccessControl>>,
    pub like_client: LikeClient,
}

impl AppState {
    pub fn new(config: Config, like_client: LikeClient) -> Self {
        Self {
            quotas: Arc::new(tokio::sync::Mutex::new(QuotaStore::new(
                config.default_daily_limit,
            ))),
            access: Arc::new(tokio::sync::Mutex::new(AccessControl::new(
                &config.admin_ids,
                &config.vip_users,
                &config.allowed_groups,
            ))),
            like_client,
            config: Arc::new(config),
        }
    }
}

pub async fn build_and_run(bot: Bot, state: AppState) {
    let handler = dptree::entry().branch(
        Update::filter_message().branch(
            dptree::entry()
                .filter_command::<commands::BotCommand>()
                .endpoint(commands::handle_command),
        ),
    );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
