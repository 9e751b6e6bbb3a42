use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status as stored by the session store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    #[default]
    NotStarted,
    Brewing,
    Fermenting,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not-started",
            SessionStatus::Brewing => "brewing",
            SessionStatus::Fermenting => "fermenting",
            SessionStatus::Completed => "completed",
        }
    }
}

/// A step ticked off during the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletedStep {
    pub step_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Canonical brewing-session record owned by the session store.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrewingSession {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// Seconds last persisted by a client.
    #[serde(default)]
    pub current_time: u64,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub completed_steps: Vec<CompletedStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fermentation_start_date: Option<DateTime<Utc>>,
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

impl BrewingSession {
    pub fn is_step_completed(&self, step_id: &str) -> bool {
        self.completed_steps
            .iter()
            .any(|completed| completed.step_id == step_id)
    }

    pub fn completed_step_ids(&self) -> HashSet<String> {
        self.completed_steps
            .iter()
            .map(|completed| completed.step_id.clone())
            .collect()
    }

    /// Records the step once; repeated calls keep the first timestamp.
    pub fn mark_step_completed(&mut self, step_id: &str, completed_at: DateTime<Utc>) {
        if self.is_step_completed(step_id) {
            return;
        }
        self.completed_steps.push(CompletedStep {
            step_id: step_id.to_string(),
            completed_at,
        });
    }

    pub fn unmark_step_completed(&mut self, step_id: &str) {
        self.completed_steps
            .retain(|completed| completed.step_id != step_id);
    }
}
