//! Step schedule: recipe steps plus synthesised process markers, and the
//! threshold checks the clock runs against them.

use std::collections::HashSet;

use brewhouse_protocol::recipe::{
    Recipe, RecipeStep, StepType, MINUTES_PER_DAY, PROCESS_MARKER_PREFIX,
};

use crate::error::ValidationError;

pub const BOIL_START_MARKER: &str = "process-boil-start";
pub const BOIL_END_MARKER: &str = "process-boil-end";

/// An auto-pause that is due: the timer should sit at `pause_at_seconds`.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoPause {
    pub pause_at_seconds: u64,
    pub trigger_step: RecipeStep,
}

/// Brew-day transitions that always need a human at the kettle. Markers at
/// minute zero are skipped.
pub fn process_markers(recipe: &Recipe) -> Vec<RecipeStep> {
    let candidates = [
        (
            BOIL_START_MARKER,
            recipe.boil_start(),
            recipe.mash_time > 0,
            "Raise wort to a rolling boil",
        ),
        (
            BOIL_END_MARKER,
            recipe.boil_end(),
            recipe.boil_time > 0,
            "Flame out and cool the wort",
        ),
    ];

    candidates
        .into_iter()
        .filter(|(_, time, enabled, _)| *enabled && *time > 0 && *time < MINUTES_PER_DAY)
        .map(|(id, time, _, description)| {
            RecipeStep::new(id, time, StepType::Other).with_description(description)
        })
        .collect()
}

/// Recipe steps followed by the synthesised markers.
pub fn timeline_steps(recipe: &Recipe) -> Vec<RecipeStep> {
    let mut steps = recipe.steps.clone();
    steps.extend(process_markers(recipe));
    steps
}

/// Finds the most recent temperature-sensitive brew-day step that is due
/// and not yet completed.
pub fn check_for_auto_pause(
    recipe: &Recipe,
    elapsed_seconds: u64,
    completed: &HashSet<String>,
) -> Option<AutoPause> {
    let current_minutes = elapsed_seconds / 60;

    timeline_steps(recipe)
        .into_iter()
        .filter(|step| {
            u64::from(step.time) <= current_minutes
                && step.is_brew_day()
                && step.is_temperature_sensitive()
                && !completed.contains(&step.id)
        })
        .max_by_key(|step| step.time)
        .map(|step| AutoPause {
            pause_at_seconds: u64::from(step.time) * 60,
            trigger_step: step,
        })
}

/// Steps whose minute is crossed by moving from `previous` to `current`
/// seconds. Each step fires once, on the tick entering its minute.
pub fn steps_due_on_tick(
    recipe: &Recipe,
    previous_seconds: u64,
    current_seconds: u64,
    completed: &HashSet<String>,
) -> Vec<RecipeStep> {
    let previous_minute = previous_seconds / 60;
    let current_minute = current_seconds / 60;
    if current_minute <= previous_minute {
        return Vec::new();
    }

    timeline_steps(recipe)
        .into_iter()
        .filter(|step| {
            let time = u64::from(step.time);
            time == current_minute
                && previous_minute < time
                && step.is_brew_day()
                && !completed.contains(&step.id)
        })
        .collect()
}

/// Checks a step entered in the recipe editor against the process windows.
pub fn validate_step(recipe: &Recipe, step: &RecipeStep) -> Result<(), ValidationError> {
    if step.id.starts_with(PROCESS_MARKER_PREFIX) {
        return Err(ValidationError::ReservedId(step.id.clone()));
    }

    let boil_start = recipe.boil_start();
    let boil_end = recipe.boil_end();

    match step.step_type {
        StepType::HopAddition | StepType::CaramelAddition | StepType::Stirring => {
            if step.time < boil_start || step.time > boil_end {
                return Err(ValidationError::OutsideBoilWindow {
                    step_id: step.id.clone(),
                    time: step.time,
                    start: boil_start,
                    end: boil_end,
                });
            }
        }
        StepType::DryHop => {
            if step.is_brew_day() {
                return Err(ValidationError::NotFermentation {
                    step_id: step.id.clone(),
                    time: step.time,
                });
            }
        }
        StepType::YeastAddition => {
            if step.time < boil_end {
                return Err(ValidationError::BeforeBoilEnd {
                    step_id: step.id.clone(),
                    time: step.time,
                    boil_end,
                });
            }
        }
        StepType::TemperatureChange => {
            if step.temperature.is_none() {
                return Err(ValidationError::MissingTemperature(step.id.clone()));
            }
        }
        StepType::Other => {}
    }

    Ok(())
}
