/// User input forwarded by the host.
///
/// Serialized in snake case: unit variants are bare strings (`"modifier_down"`), the others
/// are single-key objects (`{"click": {"x": 10.0, "y": 20.0}}`).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    /// Pointer click at a viewport pixel position.
    Click {
        /// Horizontal position, pixels.
        x: f64,
        /// Vertical position, pixels.
        y: f64,
    },
    /// Click on the current node's hotspot at `index`.
    ClickHotspot {
        /// Position in the current node's hotspot list.
        index: usize,
    },
    /// Suppression modifier pressed.
    ModifierDown,
    /// Suppression modifier released.
    ModifierUp,
    /// Viewport resized.
    Resize {
        /// New width, pixels.
        width: f64,
        /// New height, pixels.
        height: f64,
    },
}

#[cfg(test)]
#[path = "../../tests/unit/viewer/input.rs"]
mod tests;
