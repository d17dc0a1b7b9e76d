//! File logging. The terminal belongs to the game, so log output only goes to a file.

use anyhow::{Context, Result, anyhow};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;

/// Truncate `path` and route `tracing` events into it. Debug level with `verbose`, info otherwise.
pub fn init(path: &Path, verbose: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_max_level(level(verbose))
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!(e))
}

fn level(verbose: bool) -> Level {
    if verbose { Level::DEBUG } else { Level::INFO }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_selects_debug() {
        assert_eq!(level(true), Level::DEBUG);
        assert_eq!(level(false), Level::INFO);
    }

    #[test]
    fn unopenable_path_is_an_error() {
        let dir = std::env::temp_dir();
        // A directory cannot be opened for writing.
        assert!(init(&dir, false).is_err());
    }
}
