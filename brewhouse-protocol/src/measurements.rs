use serde::{Deserialize, Serialize};

/// Standard homebrew approximation: `ABV = (OG - FG) * 131.25`.
pub const ABV_FACTOR: f64 = 131.25;

pub fn calculate_abv(original_gravity: f64, final_gravity: f64) -> f64 {
    (original_gravity - final_gravity) * ABV_FACTOR
}

/// Partial update of the user-entered measurement fields.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_gravity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_gravity: Option<f64>,
    #[serde(
        default,
        rename = "calculatedABV",
        skip_serializing_if = "Option::is_none"
    )]
    pub calculated_abv: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_liters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_notes: Option<String>,
}

impl MeasurementUpdate {
    pub fn original_gravity(value: f64) -> Self {
        Self {
            original_gravity: Some(value),
            ..Self::default()
        }
    }

    pub fn final_gravity(value: f64) -> Self {
        Self {
            final_gravity: Some(value),
            ..Self::default()
        }
    }

    pub fn batch_liters(value: f64) -> Self {
        Self {
            batch_liters: Some(value),
            ..Self::default()
        }
    }

    pub fn batch_notes(value: impl Into<String>) -> Self {
        Self {
            batch_notes: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.original_gravity.is_none()
            && self.final_gravity.is_none()
            && self.calculated_abv.is_none()
            && self.batch_liters.is_none()
            && self.batch_notes.is_none()
    }

    pub fn touches_notes(&self) -> bool {
        self.batch_notes.is_some()
    }

    /// Overlays `later` on top of `self`; fields `later` leaves unset are kept.
    pub fn merge(&mut self, later: MeasurementUpdate) {
        if later.original_gravity.is_some() {
            self.original_gravity = later.original_gravity;
        }
        if later.final_gravity.is_some() {
            self.final_gravity = later.final_gravity;
        }
        if later.calculated_abv.is_some() {
            self.calculated_abv = later.calculated_abv;
        }
        if later.batch_liters.is_some() {
            self.batch_liters = later.batch_liters;
        }
        if later.batch_notes.is_some() {
            self.batch_notes = later.batch_notes;
        }
    }
}
