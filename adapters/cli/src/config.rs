use std::{fs, path::Path, time::Duration};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

const DEFAULT_SEED: u64 = 0x6861_6767_6973;
const DEFAULT_FRAME_MILLIS: u64 = 16;
const DEFAULT_MAX_FRAMES: u64 = 20_000;

/// Tunables for a play session, optionally read from a TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionConfig {
    /// Seed shared by wall heights and the computer players.
    pub(crate) seed: u64,
    /// Simulated length of a single frame.
    pub(crate) frame_millis: u64,
    /// Frames the session may simulate while waiting for a turn to come back.
    pub(crate) max_frames: u64,
    /// Lets the computer drive the hero as well.
    pub(crate) autoplay: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            frame_millis: DEFAULT_FRAME_MILLIS,
            max_frames: DEFAULT_MAX_FRAMES,
            autoplay: false,
        }
    }
}

impl SessionConfig {
    /// Loads a session file, falling back to defaults for omitted keys.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid session config at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).context("failed to parse session config toml contents")?;
        ensure!(config.frame_millis > 0, "frame_millis must be positive");
        ensure!(config.max_frames > 0, "max_frames must be positive");
        Ok(config)
    }

    /// Simulated frame length as a duration.
    #[must_use]
    pub(crate) const fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_millis)
    }
}
