use crate::render::RenderJob;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only record of completed renders, one line each.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn append(&self, job: &RenderJob) -> anyhow::Result<()> {
        let line = format_line(Local::now(), job);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// `{timestamp} [{chapter}][{start},{end}][{folder}]\n`
pub fn format_line(at: DateTime<Local>, job: &RenderJob) -> String {
    format!(
        "{} [{}][{},{}][{}]\n",
        at.format("%Y-%m-%d %H:%M:%S%.6f"),
        job.chapter,
        job.range.start,
        job.range.end,
        job.reciter_folder
    )
}
