//! Mode-switch policy for "auto" entry points.
//!
//! The classifier only reports what a query looks like; this policy
//! decides whether the session should actually switch to the detected
//! mode or merely surface a suggestion, governed by a configuration flag.

use tracing::debug;

use crate::Classification;

/// What the caller should do with a classification.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeDecision {
    /// Keep the current mode.
    Stay,

    /// Switch to the detected mode.
    Switch { mode: String, confidence: f32 },

    /// Surface the detected mode as a suggestion without switching.
    Suggest { mode: String, confidence: f32 },
}

/// Governs automatic mode switching.
#[derive(Debug, Clone)]
pub struct ModePolicy {
    /// Switch automatically instead of suggesting.
    pub auto_switch: bool,

    /// Minimum classification confidence to act on.
    pub min_confidence: f32,
}

impl Default for ModePolicy {
    fn default() -> Self {
        Self {
            auto_switch: false,
            min_confidence: 0.6,
        }
    }
}

impl ModePolicy {
    /// Decide what to do with `classification` while `current_mode` is
    /// active.
    pub fn decide(&self, current_mode: &str, classification: &Classification) -> ModeDecision {
        if classification.mode == current_mode
            || classification.confidence < self.min_confidence
        {
            return ModeDecision::Stay;
        }

        debug!(
            from = current_mode,
            to = %classification.mode,
            confidence = classification.confidence,
            auto_switch = self.auto_switch,
            "Mode change detected"
        );

        if self.auto_switch {
            ModeDecision::Switch {
                mode: classification.mode.clone(),
                confidence: classification.confidence,
            }
        } else {
            ModeDecision::Suggest {
                mode: classification.mode.clone(),
                confidence: classification.confidence,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(mode: &str, confidence: f32) -> Classification {
        Classification {
            mode: mode.into(),
            confidence,
        }
    }

    #[test]
    fn same_mode_stays() {
        let policy = ModePolicy::default();
        let decision = policy.decide("deep_research", &classified("deep_research", 1.0));
        assert_eq!(decision, ModeDecision::Stay);
    }

    #[test]
    fn low_confidence_stays() {
        // A default-mode fallback reports 0.0 and must never trigger a
        // switch away from the active mode.
        let policy = ModePolicy {
            auto_switch: true,
            ..ModePolicy::default()
        };
        let decision = policy.decide("aeromedical_risk", &classified("prompt", 0.0));
        assert_eq!(decision, ModeDecision::Stay);
    }

    #[test]
    fn auto_switch_switches() {
        let policy = ModePolicy {
            auto_switch: true,
            ..ModePolicy::default()
        };
        let decision = policy.decide("prompt", &classified("deep_research", 1.0));
        assert_eq!(
            decision,
            ModeDecision::Switch {
                mode: "deep_research".into(),
                confidence: 1.0
            }
        );
    }

    #[test]
    fn without_auto_switch_only_suggests() {
        let policy = ModePolicy::default();
        let decision = policy.decide("prompt", &classified("aerospace_medicine_rag", 1.0));
        assert_eq!(
            decision,
            ModeDecision::Suggest {
                mode: "aerospace_medicine_rag".into(),
                confidence: 1.0
            }
        );
    }
}
