use thiserror::Error;

use ud_core::SimInstant;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("trigger {trigger} is in the past (clock is at {now})")]
    PastTrigger { trigger: SimInstant, now: SimInstant },
}

pub type ClockResult<T> = Result<T, ClockError>;
