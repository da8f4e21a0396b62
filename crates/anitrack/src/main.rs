use std::sync::Arc;

use anitrack_core::{
    catalog::{Endpoint, FetchSettings, HttpCatalog},
    config::Config,
    scheduler::{PollService, PollSettings},
};
use anitrack_telegram::{Bot, TelegramSink};
use tracing::error;

mod liveness;

#[tokio::main]
async fn main() -> Result<(), anitrack_core::Error> {
    anitrack_core::logging::init("anitrack")?;

    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("{e}");
            return Err(e);
        }
    };

    tokio::spawn(liveness::serve(cfg.liveness_addr));

    let catalog = HttpCatalog::new(
        Endpoint::defaults(&cfg.jikan_base_url),
        FetchSettings::from(cfg.as_ref()),
    )?;

    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let service = PollService::new(
        PollSettings::from(cfg.as_ref()),
        Arc::new(catalog),
        Arc::new(TelegramSink::new(bot.clone())),
    );

    anitrack_telegram::router::run_polling(bot, cfg, service)
        .await
        .map_err(|e| anitrack_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
