pub mod controller;
pub mod error;
pub mod events;
pub mod state;

pub use controller::{AppStateChange, GoalBackend, GoalController, GoalSnapshot};
pub use error::GoalError;
pub use events::{GoalEvent, NoticeLevel};
pub use state::{ActiveGoal, GoalOutcome, GoalPhase, GoalState};
