use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default settings file, looked up in the working directory.
pub const SETTINGS_FILE: &str = "golem_overlay.json";

/// Environment variable overriding [`SETTINGS_FILE`].
pub const SETTINGS_ENV: &str = "GOLEM_OVERLAY_SETTINGS";

/// How the sound asset is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundMode {
    /// Loop while the overlay is visible and stop the instant it hides.
    Loop,
    /// Play once when the pointer finds the overlay.
    OneShot,
}

impl Default for SoundMode {
    fn default() -> Self {
        SoundMode::Loop
    }
}

impl std::fmt::Display for SoundMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoundMode::Loop => write!(f, "loop"),
            SoundMode::OneShot => write!(f, "one_shot"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Transparent PNG shown by the overlay. Required.
    #[serde(default = "default_image_path")]
    pub image_path: PathBuf,
    /// WAV played while the overlay is visible. Missing files are ignored.
    #[serde(default = "default_sound_path")]
    pub sound_path: Option<PathBuf>,
    #[serde(default = "default_min_delay")]
    pub min_delay_s: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_s: u64,
    /// Distance in pixels kept between the overlay and the screen edges.
    #[serde(default = "default_margin")]
    pub margin: i32,
    /// Shrink the image to this width, keeping the aspect ratio.
    #[serde(default = "default_target_width")]
    pub target_width: Option<u32>,
    /// Total fade-in duration. `0` disables the fade.
    #[serde(default = "default_fade_in_ms")]
    pub fade_in_ms: u64,
    #[serde(default = "default_fade_steps")]
    pub fade_steps: u32,
    #[serde(default = "default_cooldown")]
    pub cooldown_after_found_s: f64,
    /// Hide the overlay on its own after this many seconds. Disabled when
    /// `None`.
    #[serde(default)]
    pub auto_hide_after_s: Option<f64>,
    #[serde(default)]
    pub sound_mode: SoundMode,
    /// When enabled the application initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Write log output to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_image_path() -> PathBuf {
    PathBuf::from("golem.png")
}

fn default_sound_path() -> Option<PathBuf> {
    Some(PathBuf::from("mystic.wav"))
}

fn default_min_delay() -> u64 {
    1
}

fn default_max_delay() -> u64 {
    100
}

fn default_margin() -> i32 {
    20
}

fn default_target_width() -> Option<u32> {
    Some(128)
}

fn default_fade_in_ms() -> u64 {
    1500
}

fn default_fade_steps() -> u32 {
    30
}

fn default_cooldown() -> f64 {
    1.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_path: default_image_path(),
            sound_path: default_sound_path(),
            min_delay_s: default_min_delay(),
            max_delay_s: default_max_delay(),
            margin: default_margin(),
            target_width: default_target_width(),
            fade_in_ms: default_fade_in_ms(),
            fade_steps: default_fade_steps(),
            cooldown_after_found_s: default_cooldown(),
            auto_hide_after_s: None,
            sound_mode: SoundMode::default(),
            debug_logging: false,
            log_file: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing or empty file yields the defaults;
    /// any other read failure is returned so the caller can report it.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(anyhow::Error::new(err).context(format!("reading {path}"))),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Path of the settings file, honouring [`SETTINGS_ENV`].
    pub fn default_path() -> String {
        std::env::var(SETTINGS_ENV).unwrap_or_else(|_| SETTINGS_FILE.to_string())
    }

    /// Fix values that would break the trigger loop. Each correction is logged.
    pub fn sanitized(mut self) -> Self {
        if self.min_delay_s > self.max_delay_s {
            tracing::warn!(
                min = self.min_delay_s,
                max = self.max_delay_s,
                "delay bounds inverted; swapping"
            );
            std::mem::swap(&mut self.min_delay_s, &mut self.max_delay_s);
        }
        if !(self.cooldown_after_found_s.is_finite() && self.cooldown_after_found_s >= 0.0) {
            tracing::warn!(
                "cooldown_after_found_s {} is invalid; using 0",
                self.cooldown_after_found_s
            );
            self.cooldown_after_found_s = 0.0;
        }
        if let Some(secs) = self.auto_hide_after_s {
            if !(secs.is_finite() && secs > 0.0) {
                tracing::warn!("auto_hide_after_s {} is invalid; disabling", secs);
                self.auto_hide_after_s = None;
            }
        }
        if self.target_width == Some(0) {
            tracing::warn!("target_width 0 is invalid; keeping original size");
            self.target_width = None;
        }
        if self.margin < 0 {
            tracing::warn!("margin {} is negative; using 0", self.margin);
            self.margin = 0;
        }
        self
    }

    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_after_found_s).unwrap_or(Duration::ZERO)
    }

    pub fn auto_hide_after(&self) -> Option<Duration> {
        self.auto_hide_after_s
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    pub fn fade_in(&self) -> Duration {
        Duration::from_millis(self.fade_in_ms)
    }
}
