// SYNOID Remix Intent
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Structured style/pacing request handed to the engine by an upstream
// collaborator (prompt interpreter, CLI flags, JSON file). Read-only here.

use crate::error::{RemixError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl FromStr for Pace {
    type Err = RemixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "medium" | "normal" => Ok(Self::Medium),
            "fast" => Ok(Self::Fast),
            other => Err(RemixError::InvalidIntent(format!("unknown pace '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    #[default]
    Cut,
    Dissolve,
    Fade,
}

impl FromStr for Transition {
    type Err = RemixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cut" => Ok(Self::Cut),
            "dissolve" | "crossfade" => Ok(Self::Dissolve),
            "fade" => Ok(Self::Fade),
            other => Err(RemixError::InvalidIntent(format!("unknown transition '{}'", other))),
        }
    }
}

/// Output frame rate: explicit, or taken from the source ("auto")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawFps", into = "RawFps")]
pub enum FpsSetting {
    #[default]
    Auto,
    Fixed(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawFps {
    Number(u32),
    Text(String),
}

impl TryFrom<RawFps> for FpsSetting {
    type Error = String;

    fn try_from(raw: RawFps) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawFps::Number(0) => Ok(Self::Auto),
            RawFps::Number(n) => Ok(Self::Fixed(n)),
            RawFps::Text(s) => s.parse().map_err(|e: RemixError| e.to_string()),
        }
    }
}

impl From<FpsSetting> for RawFps {
    fn from(fps: FpsSetting) -> Self {
        match fps {
            FpsSetting::Auto => RawFps::Text("auto".to_string()),
            FpsSetting::Fixed(n) => RawFps::Number(n),
        }
    }
}

impl FromStr for FpsSetting {
    type Err = RemixError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        match s.parse::<u32>() {
            Ok(0) => Ok(Self::Auto),
            Ok(n) => Ok(Self::Fixed(n)),
            Err(_) => Err(RemixError::InvalidIntent(format!("fps must be a positive integer or 'auto', got '{}'", s))),
        }
    }
}

impl fmt::Display for FpsSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FpsSetting::Auto => write!(f, "auto"),
            FpsSetting::Fixed(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intent {
    pub style: String,
    pub pace: Pace,
    pub fps: FpsSetting,
    pub target_duration_s: Option<f64>,
    pub transition: Transition,
    pub mood: String,
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            style: "default".to_string(),
            pace: Pace::Medium,
            fps: FpsSetting::Auto,
            target_duration_s: None,
            transition: Transition::Cut,
            mood: "neutral".to_string(),
        }
    }
}

impl Intent {
    pub fn from_json(json: &str) -> Result<Self> {
        let intent: Self = serde_json::from_str(json)?;
        intent.validate()?;
        Ok(intent)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(d) = self.target_duration_s {
            if !(d.is_finite() && d > 0.0) {
                return Err(RemixError::InvalidIntent(format!(
                    "target_duration_s must be positive, got {}",
                    d
                )));
            }
        }
        Ok(())
    }

    /// Explicit intent fps, else the source rate, else the fallback
    pub fn resolve_fps(&self, source_fps: Option<f64>, fallback: f64) -> f64 {
        match self.fps {
            FpsSetting::Fixed(n) => n as f64,
            FpsSetting::Auto => source_fps
                .filter(|f| f.is_finite() && *f > 0.0)
                .unwrap_or(fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_intent() {
        let intent = Intent::from_json(
            r#"{"style":"trailer","pace":"fast","fps":15,"target_duration_s":20.0,"transition":"dissolve","mood":"energetic"}"#,
        )
        .unwrap();
        assert_eq!(intent.pace, Pace::Fast);
        assert_eq!(intent.fps, FpsSetting::Fixed(15));
        assert_eq!(intent.target_duration_s, Some(20.0));
        assert_eq!(intent.transition, Transition::Dissolve);
    }

    #[test]
    fn test_fps_auto_forms() {
        let a = Intent::from_json(r#"{"fps":"auto"}"#).unwrap();
        let b = Intent::from_json(r#"{"fps":0}"#).unwrap();
        let c = Intent::from_json(r#"{}"#).unwrap();
        assert_eq!(a.fps, FpsSetting::Auto);
        assert_eq!(b.fps, FpsSetting::Auto);
        assert_eq!(c, Intent::default());
        assert!(Intent::from_json(r#"{"fps":"fast"}"#).is_err());
    }

    #[test]
    fn test_fps_serializes_back() {
        let intent = Intent { fps: FpsSetting::Fixed(5), ..Intent::default() };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["fps"], 5);
        let json = serde_json::to_value(Intent::default()).unwrap();
        assert_eq!(json["fps"], "auto");
    }

    #[test]
    fn test_invalid_duration() {
        assert!(Intent::from_json(r#"{"target_duration_s":-1.0}"#).is_err());
        assert!(Intent::from_json(r#"{"target_duration_s":0.0}"#).is_err());
    }

    #[test]
    fn test_resolve_fps() {
        let auto = Intent::default();
        assert_eq!(auto.resolve_fps(Some(30.0), 24.0), 30.0);
        assert_eq!(auto.resolve_fps(None, 24.0), 24.0);
        let fixed = Intent { fps: FpsSetting::Fixed(5), ..Intent::default() };
        assert_eq!(fixed.resolve_fps(Some(30.0), 24.0), 5.0);
    }

    #[test]
    fn test_from_str_enums() {
        assert_eq!("FAST".parse::<Pace>().unwrap(), Pace::Fast);
        assert_eq!("fade".parse::<Transition>().unwrap(), Transition::Fade);
        assert!("wobble".parse::<Transition>().is_err());
        assert_eq!("auto".parse::<FpsSetting>().unwrap(), FpsSetting::Auto);
    }
}
