use crate::{
    foundation::core::NodeId,
    navigation::crossfade::{CrossFadeSample, sample_crossfade},
};

/// Identifies one cross-fade. Steps carrying an older token are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransitionToken(u64);

impl TransitionToken {
    /// Raw sequence number.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Cross-fade phase of the viewer.
pub enum Phase {
    /// One fully opaque current node.
    Idle,
    /// Fading from `previous` into the current node.
    Transitioning {
        /// Node being faded out.
        previous: NodeId,
        /// Time the fade started, seconds.
        fade_start: f64,
        /// Fade duration of the incoming node, seconds.
        fade_secs: f64,
        /// Token owned by this fade.
        token: TransitionToken,
    },
}

#[derive(Clone, Debug, PartialEq)]
/// Result of advancing a cross-fade by one frame.
pub enum StepOutcome {
    /// The token no longer owns the fade; nothing changed.
    Stale,
    /// Fade in progress.
    Fading {
        /// Node being faded in.
        incoming: NodeId,
        /// Node being faded out.
        outgoing: NodeId,
        /// Opacities for this frame.
        sample: CrossFadeSample,
    },
    /// Fade completed on this step; the viewer is Idle again.
    Settled {
        /// New current node, whose hotspots should now be shown.
        current: NodeId,
        /// Node that was faded out.
        outgoing: NodeId,
    },
}

#[derive(Clone, Debug)]
/// Navigation state: the current node and the in-flight cross-fade, if any.
pub struct ViewerState {
    current: NodeId,
    phase: Phase,
    last_token: u64,
}

impl ViewerState {
    /// Idle at `start`.
    pub fn new(start: NodeId) -> Self {
        Self {
            current: start,
            phase: Phase::Idle,
            last_token: 0,
        }
    }

    /// Node currently shown (or being faded in).
    pub fn current(&self) -> &NodeId {
        &self.current
    }

    /// Node being faded out, only while transitioning.
    pub fn previous(&self) -> Option<&NodeId> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Transitioning { previous, .. } => Some(previous),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether a cross-fade is in flight.
    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Transitioning { .. })
    }

    /// Start time of the in-flight cross-fade.
    pub fn fade_start(&self) -> Option<f64> {
        match self.phase {
            Phase::Idle => None,
            Phase::Transitioning { fade_start, .. } => Some(fade_start),
        }
    }

    /// Token of the in-flight cross-fade.
    pub fn live_token(&self) -> Option<TransitionToken> {
        match self.phase {
            Phase::Idle => None,
            Phase::Transitioning { token, .. } => Some(token),
        }
    }

    /// Whether `token` owns the in-flight cross-fade.
    pub fn is_live(&self, token: TransitionToken) -> bool {
        self.live_token() == Some(token)
    }

    /// Swap current into previous, make `target` current and start a fade at `now`.
    ///
    /// Any in-flight fade is abandoned; its token goes stale.
    pub fn begin(&mut self, target: NodeId, now: f64, fade_secs: f64) -> TransitionToken {
        self.last_token += 1;
        let token = TransitionToken(self.last_token);
        let previous = std::mem::replace(&mut self.current, target);
        self.phase = Phase::Transitioning {
            previous,
            fade_start: now,
            fade_secs,
            token,
        };
        token
    }

    /// Advance the fade owned by `token` to time `now`.
    pub fn step(&mut self, token: TransitionToken, now: f64) -> StepOutcome {
        let Phase::Transitioning {
            previous,
            fade_start,
            fade_secs,
            token: live,
        } = &self.phase
        else {
            return StepOutcome::Stale;
        };
        if *live != token {
            return StepOutcome::Stale;
        }

        let sample = sample_crossfade(now - fade_start, *fade_secs);
        let outgoing = previous.clone();
        if sample.finished {
            self.phase = Phase::Idle;
            StepOutcome::Settled {
                current: self.current.clone(),
                outgoing,
            }
        } else {
            StepOutcome::Fading {
                incoming: self.current.clone(),
                outgoing,
                sample,
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/navigation/state.rs"]
mod tests;
