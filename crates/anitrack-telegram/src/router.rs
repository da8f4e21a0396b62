use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use anitrack_core::{config::Config, scheduler::PollService};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub service: PollService,
}

pub async fn run_polling(bot: Bot, cfg: Arc<Config>, service: PollService) -> anyhow::Result<()> {
    if let Ok(me) = bot.get_me().await {
        info!("anitrack started: @{}", me.username());
    }
    info!(
        allowed_users = cfg.telegram_allowed_users.len(),
        interval_secs = cfg.poll_interval.as_secs(),
        "waiting for /start"
    );

    let state = Arc::new(AppState { cfg, service });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
