use serde::{Deserialize, Serialize};

use crate::signal::mode::{ModeCommand, ScanMode};
use crate::video::format::{Orientation, PixelFormat, Resolution};
use crate::video::pattern::PatternKind;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Frame source settings
    pub video: VideoConfig,
    /// Scan converter settings
    pub scan: ScanConfig,
    /// Signal stream settings
    pub stream: StreamConfig,
}

/// Frame source configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    /// Resolution width
    pub width: u32,
    /// Resolution height
    pub height: u32,
    /// Pixel format handed to the scan converter
    pub format: PixelFormat,
    /// Row order of delivered frames
    pub orientation: Orientation,
    /// Test pattern to render
    pub pattern: PatternKind,
    /// Frame rate
    pub fps: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 64,
            height: 48,
            format: PixelFormat::Rgba,
            orientation: Orientation::TopDown,
            pattern: PatternKind::Bars,
            fps: 30,
        }
    }
}

impl VideoConfig {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Scan converter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanConfig {
    /// Mode at startup
    pub mode: ScanMode,
    /// Waterfall line (negative counts from the bottom); unset means line 0
    pub line: Option<i64>,
}

impl ScanConfig {
    /// Command that puts a fresh scan converter into the configured mode
    pub fn initial_command(&self) -> ModeCommand {
        match (self.mode, self.line) {
            (ScanMode::Waterfall, Some(line)) => ModeCommand::waterfall(line),
            (mode, _) => ModeCommand::new(mode),
        }
    }
}

/// Signal stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Samples per channel in each block
    pub block_size: usize,
    /// Broadcast channel capacity in blocks
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 64,
            channel_capacity: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [video]
            format = "YUYV"
            orientation = "bottom_up"

            [scan]
            mode = "waterfall"
            line = -1
            "#,
        )
        .unwrap();
        assert_eq!(config.video.format, PixelFormat::Yuyv);
        assert_eq!(config.video.orientation, Orientation::BottomUp);
        assert_eq!(config.video.width, 64);
        assert_eq!(config.stream, StreamConfig::default());
        assert_eq!(config.scan.initial_command(), ModeCommand::waterfall(-1));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = AppConfig::default();
        config.video.pattern = PatternKind::Checker;
        config.stream.block_size = 256;
        let text = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
