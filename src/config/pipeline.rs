use std::{fs::File, io::BufReader, path::Path, time::Duration};

use crate::foundation::error::{ComposeError, ComposeResult};

/// Runtime knobs for the layout resolver and the capture controller.
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Render ticks per second while a session records.
    pub fps: u32,
    /// Floor for auto-shrunk text, in pixels.
    pub min_font_px: f64,
    /// Line box height as a multiple of the font size.
    pub line_height: f64,
    /// Upper bound on shrink-then-rewrap passes for text panels.
    pub max_shrink_passes: u32,
    /// Maximum-duration safeguard against stalled media.
    pub watchdog: WatchdogConfig,
}

/// Largest accepted watchdog multiplier.
pub const MAX_WATCHDOG_FACTOR: f64 = 100.0;
/// Largest accepted watchdog grace period (one day).
pub const MAX_WATCHDOG_GRACE_SECS: f64 = 86_400.0;

/// A session is aborted once it has run for `factor * range + grace_secs` of wall-clock time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchdogConfig {
    /// `false` lets a session run for as long as its media keeps playing.
    pub enabled: bool,
    /// Multiplier on the range duration, in `1..=100`.
    pub factor: f64,
    /// Fixed allowance added on top, in seconds.
    pub grace_secs: f64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            factor: 2.0,
            grace_secs: 10.0,
        }
    }
}

impl WatchdogConfig {
    /// Wall-clock budget for a range of `range_secs`.
    ///
    /// `None` when disabled, or when the budget is too large to represent as a [`Duration`].
    pub fn budget_for(&self, range_secs: f64) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let secs = (range_secs.max(0.0) * self.factor + self.grace_secs).max(0.0);
        Duration::try_from_secs_f64(secs).ok()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            min_font_px: 12.0,
            line_height: 1.2,
            max_shrink_passes: 3,
            watchdog: WatchdogConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ComposeResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| ComposeError::validation(format!("parse pipeline config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a configuration from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ComposeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ComposeError::validation(format!("open pipeline config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// File (if any) first, then `REELCAST_*` environment overrides.
    pub fn load(path: Option<&Path>) -> ComposeResult<Self> {
        let cfg = match path {
            Some(p) => Self::from_path(p)?,
            None => Self::default(),
        };
        let cfg = cfg.with_env_overrides(|k| std::env::var(k).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from a variable lookup. Unparseable values are ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(fps) = lookup("REELCAST_FPS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            self.fps = fps;
        }
        if let Some(px) = lookup("REELCAST_MIN_FONT_PX")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
        {
            self.min_font_px = px;
        }
        if let Some(v) = lookup("REELCAST_WATCHDOG") {
            match v.trim().to_ascii_lowercase().as_str() {
                "off" | "0" | "false" => self.watchdog.enabled = false,
                "on" | "1" | "true" => self.watchdog.enabled = true,
                _ => {}
            }
        }
        self
    }

    /// Reject values the resolver or the capture loop cannot work with.
    pub fn validate(&self) -> ComposeResult<()> {
        if self.fps == 0 {
            return Err(ComposeError::validation("fps must be > 0"));
        }
        if !self.min_font_px.is_finite() || self.min_font_px <= 0.0 {
            return Err(ComposeError::validation("min_font_px must be finite and > 0"));
        }
        if !self.line_height.is_finite() || self.line_height <= 0.0 {
            return Err(ComposeError::validation("line_height must be finite and > 0"));
        }
        if self.max_shrink_passes == 0 {
            return Err(ComposeError::validation("max_shrink_passes must be >= 1"));
        }
        if !(1.0..=MAX_WATCHDOG_FACTOR).contains(&self.watchdog.factor) {
            return Err(ComposeError::validation(format!(
                "watchdog factor must be in 1..={MAX_WATCHDOG_FACTOR}"
            )));
        }
        if !(0.0..=MAX_WATCHDOG_GRACE_SECS).contains(&self.watchdog.grace_secs) {
            return Err(ComposeError::validation(format!(
                "watchdog grace_secs must be in 0..={MAX_WATCHDOG_GRACE_SECS}"
            )));
        }
        Ok(())
    }

    /// Time between two render ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/pipeline.rs"]
mod tests;
