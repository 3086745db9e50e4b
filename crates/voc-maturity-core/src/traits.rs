//! Hooks for the presentation layer.
//!
//! A session reports every accepted transition and every scoring run to a
//! [`FlowObserver`]. Front ends use this to redraw; tests use it to record
//! what happened.

use crate::flow::Screen;
use crate::scoring::Outcome;

/// Receives session events as they happen.
pub trait FlowObserver: Send + Sync {
    /// Called after an action moved the session from one screen to another.
    /// Not called for actions that stay on the same screen.
    fn on_transition(&self, from: Screen, to: Screen);

    /// Called once when `Compute` produced an outcome.
    fn on_scored(&self, outcome: &Outcome);
}

/// No-op observer.
pub struct NoopObserver;

impl FlowObserver for NoopObserver {
    fn on_transition(&self, _: Screen, _: Screen) {}
    fn on_scored(&self, _: &Outcome) {}
}
