//! The processing parameter store.
//!
//! Holds the current [`ProcessingParameters`] and notifies listeners
//! synchronously whenever exactly one field actually changes. A setter
//! whose (clamped) value equals the current value is silent, so
//! re-applying identical parameters never produces a request.
//!
//! # Clamping policy
//!
//! Out-of-range values are clamped, never rejected:
//! - `tolerance` clamps to `0..=TOLERANCE_MAX`.
//! - `blur_radius` clamps to `0.0..=BLUR_RADIUS_MAX` and rounds to the
//!   nearest `BLUR_RADIUS_STEP`. NaN is ignored.

use crate::notify::{Notifier, SubscriptionId};
use crate::types::{
    BLUR_RADIUS_MAX, BLUR_RADIUS_STEP, Mode, ProcessingParameters, SeedColor, TOLERANCE_MAX,
};

/// Which field changed, and its new value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterChange {
    Tolerance(u8),
    BlurRadius(f64),
    Mode(Mode),
    RefineEdges(bool),
    /// `None` when the seed color was cleared by a session teardown.
    Color(Option<SeedColor>),
}

/// Clamp a raw tolerance value into the slider range.
#[must_use]
pub fn clamp_tolerance(value: i64) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clamped = value.clamp(0, i64::from(TOLERANCE_MAX)) as u8;
    clamped
}

/// Clamp and quantize a raw blur radius. Returns `None` for NaN.
#[must_use]
pub fn clamp_blur_radius(value: f64) -> Option<f64> {
    if value.is_nan() {
        return None;
    }
    let clamped = value.clamp(0.0, BLUR_RADIUS_MAX);
    // Dividing by the integral step count yields the nearest double to
    // each tenth (3.5, not 3.5000000000000004).
    let steps_per_unit = (1.0 / BLUR_RADIUS_STEP).round();
    Some((clamped * steps_per_unit).round() / steps_per_unit)
}

/// Owner of the current processing configuration.
#[derive(Debug, Default)]
pub struct ParameterStore {
    current: ProcessingParameters,
    changes: Notifier<ParameterChange>,
}

impl ParameterStore {
    /// Create a store holding the default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `initial`, after clamping.
    #[must_use]
    pub fn with_parameters(initial: ProcessingParameters) -> Self {
        let mut current = initial;
        current.tolerance = current.tolerance.min(TOLERANCE_MAX);
        current.blur_radius = clamp_blur_radius(current.blur_radius).unwrap_or(0.0);
        Self {
            current,
            changes: Notifier::new(),
        }
    }

    /// Snapshot of the current parameters.
    #[must_use]
    pub const fn snapshot(&self) -> ProcessingParameters {
        self.current
    }

    /// Set the tolerance. Returns `true` if the value changed.
    pub fn set_tolerance(&mut self, value: i64) -> bool {
        let value = clamp_tolerance(value);
        if value == self.current.tolerance {
            return false;
        }
        self.current.tolerance = value;
        self.changes.emit(&ParameterChange::Tolerance(value));
        true
    }

    /// Set the blur radius. Returns `true` if the value changed.
    pub fn set_blur_radius(&mut self, value: f64) -> bool {
        let Some(value) = clamp_blur_radius(value) else {
            log::warn!("ignoring NaN blur radius");
            return false;
        };
        // Both sides are quantized to the step, so half a step separates
        // any two distinct values.
        if (value - self.current.blur_radius).abs() < BLUR_RADIUS_STEP / 2.0 {
            return false;
        }
        self.current.blur_radius = value;
        self.changes.emit(&ParameterChange::BlurRadius(value));
        true
    }

    /// Set the removal mode. Returns `true` if the value changed.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if mode == self.current.mode {
            return false;
        }
        self.current.mode = mode;
        self.changes.emit(&ParameterChange::Mode(mode));
        true
    }

    /// Toggle edge refinement. Returns `true` if the value changed.
    pub fn set_refine_edges(&mut self, refine: bool) -> bool {
        if refine == self.current.refine_edges {
            return false;
        }
        self.current.refine_edges = refine;
        self.changes.emit(&ParameterChange::RefineEdges(refine));
        true
    }

    /// Set the seed color. Returns `true` if the value changed.
    pub fn set_color(&mut self, color: SeedColor) -> bool {
        if self.current.color == Some(color) {
            return false;
        }
        self.current.color = Some(color);
        self.changes.emit(&ParameterChange::Color(Some(color)));
        true
    }

    /// Clear the seed color. Returns `true` if one was set.
    pub fn clear_color(&mut self) -> bool {
        if self.current.color.take().is_none() {
            return false;
        }
        self.changes.emit(&ParameterChange::Color(None));
        true
    }

    /// Listen for field changes.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&ParameterChange) + 'static,
    ) -> SubscriptionId {
        self.changes.subscribe(listener)
    }

    /// Stop listening.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.changes.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recording_store() -> (ParameterStore, Rc<RefCell<Vec<ParameterChange>>>) {
        let mut store = ParameterStore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        store.subscribe(move |change| sink.borrow_mut().push(*change));
        (store, log)
    }

    #[test]
    fn each_setter_emits_exactly_one_event() {
        let (mut store, log) = recording_store();

        assert!(store.set_tolerance(45));
        assert!(store.set_blur_radius(3.5));
        assert!(store.set_mode(Mode::Advanced));
        assert!(store.set_refine_edges(true));
        assert!(store.set_color(SeedColor::new(1, 2, 3)));

        assert_eq!(
            *log.borrow(),
            vec![
                ParameterChange::Tolerance(45),
                ParameterChange::BlurRadius(3.5),
                ParameterChange::Mode(Mode::Advanced),
                ParameterChange::RefineEdges(true),
                ParameterChange::Color(Some(SeedColor::new(1, 2, 3))),
            ]
        );
        let snapshot = store.snapshot();
        assert_eq!(snapshot.tolerance, 45);
        assert_eq!(snapshot.mode, Mode::Advanced);
    }

    #[test]
    fn unchanged_values_are_silent() {
        let (mut store, log) = recording_store();

        assert!(!store.set_tolerance(30));
        assert!(!store.set_blur_radius(2.0));
        assert!(!store.set_blur_radius(2.04));
        assert!(!store.set_mode(Mode::Simple));
        assert!(!store.set_refine_edges(false));
        assert!(!store.clear_color());

        assert!(store.set_color(SeedColor::new(9, 9, 9)));
        assert!(!store.set_color(SeedColor::new(9, 9, 9)));

        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn tolerance_is_clamped() {
        let (mut store, log) = recording_store();

        assert!(store.set_tolerance(250));
        assert_eq!(store.snapshot().tolerance, 100);
        assert!(!store.set_tolerance(101));

        assert!(store.set_tolerance(-5));
        assert_eq!(store.snapshot().tolerance, 0);

        assert_eq!(
            *log.borrow(),
            vec![ParameterChange::Tolerance(100), ParameterChange::Tolerance(0)]
        );
    }

    #[test]
    fn blur_radius_is_clamped_and_quantized() {
        let mut store = ParameterStore::new();

        store.set_blur_radius(7.3);
        assert!((store.snapshot().blur_radius - 5.0).abs() < 1e-9);

        store.set_blur_radius(-1.0);
        assert!(store.snapshot().blur_radius.abs() < 1e-9);

        store.set_blur_radius(1.26);
        assert!((store.snapshot().blur_radius - 1.3).abs() < 1e-9);
    }

    #[test]
    fn nan_blur_radius_is_ignored() {
        let (mut store, log) = recording_store();
        assert!(!store.set_blur_radius(f64::NAN));
        assert!(log.borrow().is_empty());
        assert!((store.snapshot().blur_radius - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clear_color_emits_none() {
        let (mut store, log) = recording_store();
        store.set_color(SeedColor::new(5, 5, 5));
        assert!(store.clear_color());
        assert_eq!(log.borrow().last(), Some(&ParameterChange::Color(None)));
        assert!(store.snapshot().color.is_none());
    }

    #[test]
    fn with_parameters_clamps_initial_values() {
        let store = ParameterStore::with_parameters(ProcessingParameters {
            tolerance: 200,
            blur_radius: 9.0,
            ..ProcessingParameters::default()
        });
        assert_eq!(store.snapshot().tolerance, 100);
        assert!((store.snapshot().blur_radius - 5.0).abs() < 1e-9);
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let mut store = ParameterStore::new();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = store.subscribe(move |_| *sink.borrow_mut() += 1);

        store.set_tolerance(1);
        assert!(store.unsubscribe(id));
        store.set_tolerance(2);

        assert_eq!(*count.borrow(), 1);
    }
}
