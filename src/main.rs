use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use foxy::bot::{persona_prompt, telegram_to_event, MessagePipeline, PipelineConfig, TelegramClient};
use foxy::caption::CaptionClient;
use foxy::config::{self, Config, ConfigError};
use foxy::openai::Client as OpenAiClient;

#[tokio::main]
async fn main() {
    let loaded_env = config::load_env_file();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(ConfigError::Missing(vars)) => {
            let env_path = config::template_path(loaded_env.as_deref());
            match config::write_template(&env_path) {
                Ok(true) => eprintln!("Wrote a configuration template to {}.", env_path.display()),
                Ok(false) => eprintln!("Settings file {} already exists, leaving it as is.", env_path.display()),
                Err(e) => eprintln!("{e}"),
            }
            eprintln!("Missing required settings: {}. Fill them in and start again.", vars.join(", "));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("foxy.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file: {e}");
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🦊 Starting foxy...");
    info!("Listening in chats: {:?}", config.channel_ids);
    info!("Models: decision={}, reply={}", config.decision_model, config.reply_model);
    if config.caption_endpoint.is_none() {
        warn!("No captioning endpoint configured, images will get a placeholder caption");
    }
    if config.dry_run {
        info!("DRY RUN mode enabled");
    }

    let bot = Bot::new(&config.telegram_bot_token);

    let bot_user_id = match bot.get_me().await {
        Ok(me) => {
            info!("Bot user ID: {}, username: @{}", me.id, me.username());
            me.id.0 as i64
        }
        Err(e) => {
            warn!("Failed to get bot info: {e}");
            0
        }
    };

    let openai = Arc::new(OpenAiClient::new(config.openai_api_key.clone(), config.openai_base_url.clone()));
    let captioner = Arc::new(CaptionClient::new(config.caption_endpoint.clone(), config.caption_token.clone()));
    let telegram = Arc::new(TelegramClient::new(bot.clone(), config.dry_run));

    let pipeline_config = PipelineConfig {
        bot_user_id,
        bot_name: config.bot_name.clone(),
        channel_ids: config.channel_ids.clone(),
        decision_model: config.decision_model.clone(),
        reply_model: config.reply_model.clone(),
        on_ambiguous: config.on_ambiguous,
        on_moderation_error: config.on_moderation_error,
    };
    let persona = persona_prompt(&config.bot_name, config.persona.as_deref());

    let pipeline = Arc::new(MessagePipeline::new(
        pipeline_config,
        persona,
        telegram,
        openai.clone(),
        captioner,
        openai,
    ));

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_new_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_new_message(msg: Message, pipeline: Arc<MessagePipeline>) -> ResponseResult<()> {
    let Some(event) = telegram_to_event(&msg) else {
        return Ok(());
    };

    if let Err(e) = pipeline.handle(event).await {
        error!("Pipeline error for message {} in chat {}: {e}", msg.id.0, msg.chat.id.0);
    }

    Ok(())
}
