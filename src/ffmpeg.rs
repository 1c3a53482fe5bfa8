use crate::error::RenderError;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, error};

/// Run ffmpeg to completion, surfacing the tail of stderr on failure.
pub fn run<I, S>(args: I) -> Result<(), RenderError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-hide_banner")
        .args(["-loglevel", "error"])
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    debug!("Running {:?}", cmd);

    let output = cmd
        .output()
        .map_err(|e| RenderError::Ffmpeg(format!("failed to spawn ffmpeg: {}", e)))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(5)..].join("\n");
        error!("ffmpeg exited with {}: {}", output.status, tail);
        return Err(RenderError::Ffmpeg(format!("exit {}: {}", output.status, tail)));
    }
    Ok(())
}

pub fn is_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn escape_chars(text: &str, specials: &[char]) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if specials.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Escape a path for use as a filter option value inside `-filter_complex`.
///
/// The option parser and the filtergraph parser each strip one level of escaping.
pub fn escape_filter_path(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let option = escape_chars(&normalized, &['\\', '\'', ':']);
    escape_chars(&option, &['\\', '\'', '[', ']', ',', ';'])
}
