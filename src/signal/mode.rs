//! Scan modes and the mode command

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// How the scan position moves across a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Restart at the top-left corner every call
    #[default]
    Clear,
    /// Continuous raster scan, position carried across calls
    Fill,
    /// One row per call, advancing one row each call
    Line,
    /// One fixed row per call
    Waterfall,
}

impl ScanMode {
    pub fn all() -> &'static [ScanMode] {
        &[
            ScanMode::Clear,
            ScanMode::Fill,
            ScanMode::Line,
            ScanMode::Waterfall,
        ]
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanMode::Clear => "clear",
            ScanMode::Fill => "fill",
            ScanMode::Line => "line",
            ScanMode::Waterfall => "waterfall",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ScanMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "clear" => Ok(ScanMode::Clear),
            "fill" => Ok(ScanMode::Fill),
            "line" => Ok(ScanMode::Line),
            "waterfall" => Ok(ScanMode::Waterfall),
            _ => Err(AppError::InvalidCommand(format!(
                "invalid mode '{}' (must be one of 'clear', 'fill', 'line' or 'waterfall')",
                s
            ))),
        }
    }
}

/// Scan position and mode of one scan converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanState {
    pub mode: ScanMode,
    /// Column of the next sample
    pub offset_x: usize,
    /// Line of the next sample, counted in display order
    pub offset_y: usize,
    /// Line read in waterfall mode; negative values count from the bottom
    pub line: i64,
}

/// Target line of a waterfall command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTarget {
    /// Whatever line the scan is on when the command is applied
    Current,
    Fixed(i64),
}

/// A parsed mode-change command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeCommand {
    pub mode: ScanMode,
    /// Only set for waterfall
    pub line: Option<LineTarget>,
}

impl ModeCommand {
    pub fn new(mode: ScanMode) -> Self {
        let line = (mode == ScanMode::Waterfall).then_some(LineTarget::Current);
        Self { mode, line }
    }

    pub fn waterfall(line: i64) -> Self {
        Self {
            mode: ScanMode::Waterfall,
            line: Some(LineTarget::Fixed(line)),
        }
    }

    /// Parse `[mode] <name> [<param>]`
    ///
    /// `line <n>` selects waterfall at line n. Only waterfall takes a
    /// parameter; any other argument count is rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let mut words: Vec<&str> = input.split_whitespace().collect();
        if words
            .first()
            .is_some_and(|w| w.eq_ignore_ascii_case("mode"))
        {
            words.remove(0);
        }

        let (name, params) = match words.split_first() {
            Some((name, params)) => (*name, params),
            None => {
                return Err(AppError::InvalidCommand(
                    "usage: mode <type> [<params>]".to_string(),
                ))
            }
        };

        let mode: ScanMode = name.parse()?;
        match (mode, params) {
            (_, []) => Ok(Self::new(mode)),
            (ScanMode::Line | ScanMode::Waterfall, [param]) => Ok(Self::waterfall(parse_line(param)?)),
            _ => Err(AppError::InvalidCommand(format!(
                "usage: mode {}{}",
                mode,
                if mode == ScanMode::Waterfall { " [<line>]" } else { "" }
            ))),
        }
    }

    /// State after applying this command to `state`
    ///
    /// Offsets restart at the top-left corner.
    pub fn apply(&self, state: &ScanState) -> ScanState {
        let line = match self.line {
            Some(LineTarget::Fixed(line)) => line,
            Some(LineTarget::Current) => state.offset_y as i64,
            None => state.line,
        };
        ScanState {
            mode: self.mode,
            offset_x: 0,
            offset_y: 0,
            line,
        }
    }
}

impl FromStr for ModeCommand {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ModeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(LineTarget::Fixed(line)) => write!(f, "mode {} {}", self.mode, line),
            _ => write!(f, "mode {}", self.mode),
        }
    }
}

fn parse_line(param: &str) -> Result<i64> {
    if let Ok(line) = param.parse::<i64>() {
        return Ok(line);
    }
    match param.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
        _ => Err(AppError::InvalidCommand(format!(
            "line must be an integer, got '{}'",
            param
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_names() {
        for &mode in ScanMode::all() {
            let command = ModeCommand::parse(&format!("mode {}", mode)).unwrap();
            assert_eq!(command.mode, mode);
        }
        assert_eq!(ModeCommand::parse("FILL").unwrap().mode, ScanMode::Fill);
    }

    #[test]
    fn test_parse_waterfall_line() {
        assert_eq!(
            ModeCommand::parse("mode waterfall 12").unwrap(),
            ModeCommand::waterfall(12)
        );
        assert_eq!(
            ModeCommand::parse("mode line 3").unwrap(),
            ModeCommand::waterfall(3)
        );
        assert_eq!(
            ModeCommand::parse("waterfall -1.0").unwrap(),
            ModeCommand::waterfall(-1)
        );
        assert_eq!(
            ModeCommand::parse("mode waterfall").unwrap().line,
            Some(LineTarget::Current)
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for input in [
            "",
            "mode",
            "mode sideways",
            "mode fill 3",
            "mode clear now",
            "mode waterfall 1 2",
            "mode waterfall 1.5",
            "mode waterfall top",
        ] {
            assert!(
                matches!(ModeCommand::parse(input), Err(AppError::InvalidCommand(_))),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_apply_resets_offsets() {
        let state = ScanState {
            mode: ScanMode::Fill,
            offset_x: 5,
            offset_y: 7,
            line: 2,
        };

        let next = ModeCommand::new(ScanMode::Waterfall).apply(&state);
        assert_eq!(next.line, 7);
        assert_eq!((next.offset_x, next.offset_y), (0, 0));

        let next = ModeCommand::new(ScanMode::Line).apply(&state);
        assert_eq!(next.mode, ScanMode::Line);
        assert_eq!(next.line, 2);
    }

    #[test]
    fn test_display_round_trip() {
        let command = ModeCommand::waterfall(-4);
        assert_eq!(command.to_string(), "mode waterfall -4");
        assert_eq!(command.to_string().parse::<ModeCommand>().unwrap(), command);
    }
}
