pub mod api;
pub mod measurements;
pub mod recipe;
pub mod session;

pub mod prelude {
    pub use crate::api::{CompleteRequest, ErrorBody, SessionEnvelope, StatusResponse, TimeUpdate};
    pub use crate::measurements::{calculate_abv, MeasurementUpdate, ABV_FACTOR};
    pub use crate::recipe::{Recipe, RecipeStep, StepType, MINUTES_PER_DAY, PROCESS_MARKER_PREFIX};
    pub use crate::session::{BrewingSession, CompletedStep, SessionStatus};
}
