use serde::{Deserialize, Serialize};

/// Step offsets at or above this many minutes belong to fermentation.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Reserved id prefix for synthesised process-transition markers.
pub const PROCESS_MARKER_PREFIX: &str = "process-";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StepType {
    HopAddition,
    DryHop,
    CaramelAddition,
    YeastAddition,
    TemperatureChange,
    Stirring,
    Other,
}

/// One entry of a recipe's immutable step list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStep {
    pub id: String,
    /// Minutes from process start.
    pub time: u32,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RecipeStep {
    pub fn new(id: impl Into<String>, time: u32, step_type: StepType) -> Self {
        Self {
            id: id.into(),
            time,
            step_type,
            amount: None,
            temperature: None,
            description: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_brew_day(&self) -> bool {
        self.time < MINUTES_PER_DAY
    }

    /// Whole fermentation day the step falls on, if it is not a brew-day step.
    pub fn fermentation_day(&self) -> Option<u32> {
        (!self.is_brew_day()).then(|| self.time / MINUTES_PER_DAY)
    }

    pub fn is_process_marker(&self) -> bool {
        self.id.starts_with(PROCESS_MARKER_PREFIX)
    }

    /// Steps that need a human to adjust the temperature before the process
    /// can continue.
    pub fn is_temperature_sensitive(&self) -> bool {
        self.step_type == StepType::TemperatureChange
            || self.temperature.is_some()
            || self.is_process_marker()
    }
}

/// Recipe as served by the recipe store: process parameters plus steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Mash duration in minutes.
    #[serde(default)]
    pub mash_time: u32,
    /// Boil duration in minutes.
    #[serde(default)]
    pub boil_time: u32,
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
}

impl Recipe {
    pub fn boil_start(&self) -> u32 {
        self.mash_time
    }

    pub fn boil_end(&self) -> u32 {
        self.mash_time.saturating_add(self.boil_time)
    }

    pub fn step(&self, step_id: &str) -> Option<&RecipeStep> {
        self.steps.iter().find(|step| step.id == step_id)
    }
}
