use thiserror::Error;
use ud_clock::ClockError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("scheduling error: {0}")]
    Clock(#[from] ClockError),

    #[error("simulation configuration error: {0}")]
    Config(String),
}

pub type SimResult<T> = Result<T, SimError>;
