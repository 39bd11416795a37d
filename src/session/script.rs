use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;

use crate::{
    foundation::core::Viewport,
    foundation::error::{ViewerError, ViewerResult},
    viewer::input::InputEvent,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// One input event at a session time.
pub struct ScriptedEvent {
    /// Session time in seconds.
    pub at: f64,
    /// Event delivered at `at`.
    pub event: InputEvent,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
/// A timed sequence of input events replayed against a viewer.
pub struct Script {
    /// Initial viewport, `[width, height]` in pixels.
    pub viewport: [f64; 2],
    /// Session length in seconds.
    pub duration_secs: f64,
    /// Events sorted by time.
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
}

impl Script {
    /// Parse and validate a JSON script.
    pub fn from_json_str(json: &str) -> ViewerResult<Self> {
        let script: Self =
            serde_json::from_str(json).map_err(|e| ViewerError::serde(e.to_string()))?;
        script.validate()?;
        Ok(script)
    }

    /// Read, parse and validate a JSON script file.
    pub fn from_json_file(path: &Path) -> ViewerResult<Self> {
        let f = File::open(path).with_context(|| format!("open script '{}'", path.display()))?;
        let script: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| ViewerError::serde(format!("script '{}': {e}", path.display())))?;
        script.validate()?;
        Ok(script)
    }

    /// Initial viewport.
    pub fn viewport(&self) -> ViewerResult<Viewport> {
        Viewport::new(self.viewport[0], self.viewport[1])
    }

    /// Check the viewport, the duration and the event times.
    pub fn validate(&self) -> ViewerResult<()> {
        self.viewport()?;
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(ViewerError::validation(
                "script duration_secs must be finite and >= 0",
            ));
        }

        let mut last = 0.0;
        for (i, ev) in self.events.iter().enumerate() {
            if !ev.at.is_finite() || ev.at < 0.0 {
                return Err(ViewerError::validation(format!(
                    "script event {i}: time must be finite and >= 0"
                )));
            }
            if ev.at < last {
                return Err(ViewerError::validation(format!(
                    "script event {i}: events must be sorted by time"
                )));
            }
            if ev.at > self.duration_secs {
                return Err(ViewerError::validation(format!(
                    "script event {i}: time {} is past the session end",
                    ev.at
                )));
            }
            last = ev.at;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/script.rs"]
mod tests;
