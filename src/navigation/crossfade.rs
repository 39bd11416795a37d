/// Opacities of the two image layers at one instant of a cross-fade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossFadeSample {
    /// Linear progress in [0, 1].
    pub progress: f64,
    /// Opacity of the node being faded in.
    pub incoming: f64,
    /// Opacity of the node being faded out.
    pub outgoing: f64,
    /// Whether the full duration has elapsed.
    pub finished: bool,
}

/// Linear cross-fade progress, clamped to [0, 1]. A non-positive duration is complete at once.
pub fn crossfade_progress(elapsed_secs: f64, duration_secs: f64) -> f64 {
    if duration_secs <= 0.0 || !duration_secs.is_finite() {
        return 1.0;
    }
    (elapsed_secs / duration_secs).clamp(0.0, 1.0)
}

/// Sample the squared-easing cross-fade: incoming `t²`, outgoing `(1 − t)²`.
pub fn sample_crossfade(elapsed_secs: f64, duration_secs: f64) -> CrossFadeSample {
    let t = crossfade_progress(elapsed_secs, duration_secs);
    let out = 1.0 - t;
    CrossFadeSample {
        progress: t,
        incoming: t * t,
        outgoing: out * out,
        finished: elapsed_secs >= duration_secs,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/navigation/crossfade.rs"]
mod tests;
