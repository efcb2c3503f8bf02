//! Confidence thresholds with per-class overrides.

use crate::labels::LabelProvider;
use crate::trace::trace_event;
use crate::util::{SightlineError, SightlineResult};
use std::collections::BTreeMap;

/// Default global confidence threshold.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

fn check_threshold(name: &str, value: f32) -> SightlineResult<f32> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(SightlineError::InvalidThreshold {
            name: name.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Global confidence threshold plus overrides keyed by class name.
///
/// Values are checked on construction, so a `Thresholds` that exists is
/// always in range. It is passed into every detect call rather than held as
/// process-wide state.
#[derive(Clone, Debug, PartialEq)]
pub struct Thresholds {
    global: f32,
    overrides: BTreeMap<String, f32>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            global: DEFAULT_CONFIDENCE_THRESHOLD,
            overrides: BTreeMap::new(),
        }
    }
}

impl Thresholds {
    /// Creates thresholds with only a global cutoff.
    pub fn new(global: f32) -> SightlineResult<Self> {
        Ok(Self {
            global: check_threshold("global", global)?,
            overrides: BTreeMap::new(),
        })
    }

    /// Creates thresholds with a global cutoff and class-name overrides.
    pub fn with_overrides<I, S>(global: f32, overrides: I) -> SightlineResult<Self>
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        let mut out = Self::new(global)?;
        for (name, value) in overrides {
            out = out.with_override(name, value)?;
        }
        Ok(out)
    }

    /// Adds or replaces the override for one class name.
    pub fn with_override(mut self, name: impl Into<String>, value: f32) -> SightlineResult<Self> {
        let name = name.into();
        let value = check_threshold(&name, value)?;
        self.overrides.insert(name, value);
        Ok(self)
    }

    /// Returns the global threshold.
    pub fn global(&self) -> f32 {
        self.global
    }

    /// Returns the override for a class name, if any.
    pub fn override_for(&self, name: &str) -> Option<f32> {
        self.overrides.get(name).copied()
    }

    /// Iterates overrides in name order.
    pub fn overrides(&self) -> impl Iterator<Item = (&str, f32)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Cutoff applied to a class, falling back to the global threshold.
    pub fn effective(&self, class_name: Option<&str>) -> f32 {
        class_name
            .and_then(|name| self.override_for(name))
            .unwrap_or(self.global)
    }

    /// Builds a class-id indexed table for `num_classes` classes.
    ///
    /// Override names with no matching label are skipped.
    pub fn resolve<L: LabelProvider + ?Sized>(
        &self,
        labels: &L,
        num_classes: usize,
    ) -> ClassThresholds {
        let per_class: Vec<f32> = (0..num_classes)
            .map(|id| self.effective(labels.label(id)))
            .collect();

        let unmatched = self
            .overrides
            .keys()
            .filter(|name| labels.class_id(name).is_none())
            .count();
        if unmatched > 0 {
            trace_event!("unmatched_threshold_overrides", count = unmatched);
        }

        ClassThresholds {
            per_class,
            global: self.global,
        }
    }
}

/// Effective thresholds indexed by class id.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassThresholds {
    per_class: Vec<f32>,
    global: f32,
}

impl ClassThresholds {
    /// Same cutoff for every class.
    pub fn uniform(global: f32) -> Self {
        Self {
            per_class: Vec::new(),
            global,
        }
    }

    /// Cutoff for `class_id`; ids outside the table use the global value.
    #[inline]
    pub fn get(&self, class_id: usize) -> f32 {
        self.per_class.get(class_id).copied().unwrap_or(self.global)
    }
}
