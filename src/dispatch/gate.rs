use crate::config::HoverConfig;
use crate::parsing::Strictness;

/// Decides whether declaration-based hovers on dynamic references run for a
/// file. Strictly typed files defer those to the type checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrictnessGate {
    typechecker_enabled: bool,
    threshold: Strictness,
}

impl StrictnessGate {
    pub fn new(typechecker_enabled: bool, threshold: Strictness) -> Self {
        Self {
            typechecker_enabled,
            threshold,
        }
    }

    pub fn from_config(config: &HoverConfig) -> Self {
        Self::new(config.typechecker_enabled, config.gate_threshold)
    }

    /// True when listeners for dynamic references may run on a file of
    /// this strictness.
    pub fn allows(&self, strictness: Strictness) -> bool {
        !(self.typechecker_enabled && strictness >= self.threshold)
    }
}

impl Default for StrictnessGate {
    fn default() -> Self {
        Self::new(true, Strictness::True)
    }
}
