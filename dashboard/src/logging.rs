use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_LOG_PATH: &str = "./data/dashboard.log";

/// `RWS_LOG_PATH`, or [`DEFAULT_LOG_PATH`] when unset or empty.
pub fn log_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("RWS_LOG_PATH")
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH))
}

/// Sends tracing output to `path` instead of the terminal, which belongs to
/// the dashboard while it runs.
pub fn init_file(path: &Path) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_default_and_override() {
        assert_eq!(log_path(|_| None), PathBuf::from(DEFAULT_LOG_PATH));
        assert_eq!(log_path(|_| Some("  ".to_string())), PathBuf::from(DEFAULT_LOG_PATH));
        assert_eq!(
            log_path(|var| (var == "RWS_LOG_PATH").then(|| "/tmp/rws.log".to_string())),
            PathBuf::from("/tmp/rws.log")
        );
    }
}
