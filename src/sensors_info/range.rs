use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Inclusive numeric interval. `min <= max` is checked by whoever builds it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Range {
        Range { min, max }
    }

    pub fn unbounded() -> Range {
        Range::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    pub fn is_within(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }

    /// True iff `self` lies entirely inside `other`.
    pub fn is_subrange(&self, other: &Range) -> bool {
        other.min <= self.min && self.max <= other.max
    }
}
