use tracing::{debug, info, warn};

use crate::modules::action::Action;
use crate::modules::bot::DecisionError;
use crate::modules::grid::Position;
use crate::modules::pathfinder::{PathError, PathStep};

/// Diagnostic sink for turn decisions.
///
/// Every method has an empty default so the decision code never depends on
/// a particular output. [`NoopLog`] discards everything; [`TracingLog`]
/// forwards to `tracing`.
pub trait DecisionLog {
    fn candidate(&self, _position: Position, _distance: f64) {}

    fn target(&self, _position: Position, _returning_home: bool) {}

    fn route(&self, _start: Position, _end: Position, _step: &PathStep) {}

    fn fallback(&self, _reason: &str) {}

    fn unreachable(&self, _error: &PathError) {}

    fn chosen(&self, _action: &Action) {}

    fn idle(&self, _error: &DecisionError) {}
}

impl<T: DecisionLog + ?Sized> DecisionLog for &T {
    fn candidate(&self, position: Position, distance: f64) {
        (**self).candidate(position, distance)
    }

    fn target(&self, position: Position, returning_home: bool) {
        (**self).target(position, returning_home)
    }

    fn route(&self, start: Position, end: Position, step: &PathStep) {
        (**self).route(start, end, step)
    }

    fn fallback(&self, reason: &str) {
        (**self).fallback(reason)
    }

    fn unreachable(&self, error: &PathError) {
        (**self).unreachable(error)
    }

    fn chosen(&self, action: &Action) {
        (**self).chosen(action)
    }

    fn idle(&self, error: &DecisionError) {
        (**self).idle(error)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLog;

impl DecisionLog for NoopLog {}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl DecisionLog for TracingLog {
    fn candidate(&self, position: Position, distance: f64) {
        debug!(%position, distance, "resource candidate");
    }

    fn target(&self, position: Position, returning_home: bool) {
        info!(%position, returning_home, "target selected");
    }

    fn route(&self, start: Position, end: Position, step: &PathStep) {
        debug!(
            %start,
            %end,
            distance = step.distance,
            first_step = ?step.first_step,
            "route found"
        );
    }

    fn fallback(&self, reason: &str) {
        info!(reason, "falling back to blocked behavior");
    }

    fn unreachable(&self, error: &PathError) {
        warn!(%error, "goal unreachable");
    }

    fn chosen(&self, action: &Action) {
        info!(%action, "action chosen");
    }

    fn idle(&self, error: &DecisionError) {
        warn!(%error, "no legal action; staying in place");
    }
}
