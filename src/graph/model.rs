use crate::{
    audio::gain::decibel_to_linear,
    foundation::core::NodeId,
    foundation::error::{ViewerError, ViewerResult},
};

/// Image cross-fade duration used when a node does not set one.
pub const DEFAULT_IMAGE_FADE_SECS: f64 = 2.0;
/// Audio fade-in/fade-out duration used when a node does not set one.
pub const DEFAULT_AUDIO_FADE_SECS: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A navigable unit: one image, one sound, and the hotspots leading away from it.
pub struct Node {
    /// Unique node id.
    pub id: NodeId,
    /// Full-screen image shown while this node is current.
    pub image: ImageRef,
    /// Sound started when this node becomes current.
    pub audio: AudioRef,
    /// Clickable links, in authoring order.
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Image reference of a node.
pub struct ImageRef {
    /// File name under the asset root's `images/` directory.
    pub file_name: String,
    /// Cross-fade duration when fading *into* this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_secs: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Audio reference of a node.
pub struct AudioRef {
    /// File name under the asset root's `sounds/` directory.
    pub file_name: String,
    /// Playback gain in decibels.
    #[serde(default)]
    pub gain_db: f64,
    /// Loop the sound until the next navigation.
    #[serde(default, rename = "loop")]
    pub looping: bool,
    /// Start phase-aligned with the looping sound that is playing.
    #[serde(default)]
    pub sync: bool,
    /// Gain ramp duration from silence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in_secs: Option<f64>,
    /// Gain ramp duration to silence when the next node takes over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out_secs: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Circular link drawn on a node's image.
pub struct Hotspot {
    /// Horizontal center as a fraction of the rendered image width.
    pub x: f64,
    /// Vertical center as a fraction of the rendered image height.
    pub y: f64,
    /// Diameter in percent of the rendered image width.
    pub size: f64,
    /// Node reached by clicking this hotspot.
    pub target: NodeId,
}

impl ImageRef {
    /// Effective cross-fade duration in seconds.
    pub fn fade_secs(&self) -> f64 {
        resolve_secs(self.fade_secs, DEFAULT_IMAGE_FADE_SECS)
    }
}

impl AudioRef {
    /// Effective fade-in duration in seconds.
    pub fn fade_in_secs(&self) -> f64 {
        resolve_secs(self.fade_in_secs, DEFAULT_AUDIO_FADE_SECS)
    }

    /// Effective fade-out duration in seconds.
    pub fn fade_out_secs(&self) -> f64 {
        resolve_secs(self.fade_out_secs, DEFAULT_AUDIO_FADE_SECS)
    }

    /// Linear gain factor for `gain_db`.
    pub fn gain_factor(&self) -> f64 {
        decibel_to_linear(self.gain_db)
    }
}

impl Node {
    /// Validate everything that can be checked without looking at other nodes.
    pub fn validate(&self) -> ViewerResult<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(ViewerError::validation("node id must be non-empty"));
        }
        let id = &self.id;

        validate_rel_source(&self.image.file_name, &format!("node '{id}' image.file_name"))?;
        validate_rel_source(&self.audio.file_name, &format!("node '{id}' audio.file_name"))?;

        validate_fade(self.image.fade_secs, &format!("node '{id}' image.fade_secs"))?;
        validate_fade(self.audio.fade_in_secs, &format!("node '{id}' audio.fade_in_secs"))?;
        validate_fade(
            self.audio.fade_out_secs,
            &format!("node '{id}' audio.fade_out_secs"),
        )?;

        if !self.audio.gain_db.is_finite() {
            return Err(ViewerError::validation(format!(
                "node '{id}' audio.gain_db must be finite"
            )));
        }

        for (i, h) in self.hotspots.iter().enumerate() {
            for (name, v) in [("x", h.x), ("y", h.y)] {
                if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                    return Err(ViewerError::validation(format!(
                        "node '{id}' hotspot {i} {name} must be within [0, 1]"
                    )));
                }
            }
            if !h.size.is_finite() || h.size <= 0.0 {
                return Err(ViewerError::validation(format!(
                    "node '{id}' hotspot {i} size must be finite and > 0"
                )));
            }
        }

        Ok(())
    }
}

// Unset and zero both fall back to the default.
fn resolve_secs(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v > 0.0 => v,
        _ => default,
    }
}

fn validate_fade(value: Option<f64>, field: &str) -> ViewerResult<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ViewerError::validation(format!(
            "{field} must be finite and >= 0"
        ))),
        _ => Ok(()),
    }
}

fn validate_rel_source(source: &str, field: &str) -> ViewerResult<()> {
    if source.trim().is_empty() {
        return Err(ViewerError::validation(format!("{field} must be non-empty")));
    }
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ViewerError::validation(format!(
            "{field} must be a relative path"
        )));
    }
    for part in s.split('/') {
        if part == ".." {
            return Err(ViewerError::validation(format!(
                "{field} must not contain '..'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/graph/model.rs"]
mod tests;
