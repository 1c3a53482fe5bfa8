use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "quranreel", about = "Telegram bot that renders recitation videos")]
pub struct Args {
    /// Bot API token.
    #[clap(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Prompt strings and reciter list.
    #[clap(long, default_value = "./commands.json")]
    pub commands: PathBuf,

    /// Chapter index (titles and verse counts).
    #[clap(long, default_value = "./assets/quran.json")]
    pub corpus: PathBuf,

    /// Directory of `surah_{n}.json` verse files.
    #[clap(long, default_value = "./assets/quran")]
    pub verses_dir: PathBuf,

    #[clap(long, default_value = "./config/config.json")]
    pub render_config: PathBuf,

    #[clap(long, default_value = "./assets/font")]
    pub fonts_dir: PathBuf,

    /// One folder per reciter holding `{chapter:03}{verse:03}.mp3` clips.
    #[clap(long, default_value = "./assets/reciters")]
    pub reciters_dir: PathBuf,

    #[clap(long, default_value = "./log.txt")]
    pub audit_log: PathBuf,

    /// Renders allowed to run at once.
    #[clap(long, default_value_t = 16)]
    pub workers: usize,

    /// Seconds to wait before polling again after a failed poll.
    #[clap(long, default_value_t = 10)]
    pub restart_delay: u64,
}
