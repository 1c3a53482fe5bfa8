use clap::Parser;
use quranreel::args::Args;
use quranreel::audit::AuditLog;
use quranreel::bot::Bot;
use quranreel::config::{RenderConfig, Strings, load_json_or_default};
use quranreel::conversation::Controller;
use quranreel::ffmpeg;
use quranreel::render::{AssetPaths, PipelineRenderer, RenderPool};
use quranreel::session::MemorySessionStore;
use quranreel::telegram::TelegramClient;
use quranreel::verses::VerseStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting recitation video bot");

    let args = Args::parse();

    if !ffmpeg::is_available() {
        warn!("ffmpeg not found on PATH; renders will fail");
    }

    let strings: Strings = load_json_or_default(&args.commands);
    info!("Loaded {} reciters", strings.reciters.len());
    let render_config: RenderConfig = load_json_or_default(&args.render_config);
    info!(
        "Rendering {}x{} at font size {}",
        render_config.video_width, render_config.video_height, render_config.font_size
    );
    let verses = Arc::new(VerseStore::load(&args.corpus, &args.verses_dir));

    let renderer = PipelineRenderer::new(
        verses.clone(),
        render_config,
        AssetPaths {
            fonts_dir: args.fonts_dir.clone(),
            reciters_dir: args.reciters_dir.clone(),
        },
    );
    let gateway = Arc::new(TelegramClient::new(&args.token)?);
    let controller = Controller::new(
        gateway.clone(),
        Arc::new(MemorySessionStore::default()),
        verses,
        Arc::new(strings),
        RenderPool::new(renderer, args.workers),
        AuditLog::new(&args.audit_log),
    );

    let bot = Bot::new(gateway, controller, Duration::from_secs(args.restart_delay));
    bot.run_until(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await;

    info!("Process complete.");
    Ok(())
}
