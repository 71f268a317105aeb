use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data parse error: {0}")]
    Parse(String),

    #[error("row for vehicle {vehicle:?} references unknown establishment {establishment:?}")]
    UnknownEstablishment { establishment: String, vehicle: String },

    #[error("establishment source produced no establishments")]
    NoEstablishments,

    #[error("road graph has no delivery-eligible nodes to resolve establishments onto")]
    NoEligibleNodes,
}

pub type FleetResult<T> = Result<T, FleetError>;
