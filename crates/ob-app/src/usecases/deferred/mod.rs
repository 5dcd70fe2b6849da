mod coordinator;

pub use coordinator::{AttemptOutcome, CoordinatorError, DeferredActionCoordinator};
