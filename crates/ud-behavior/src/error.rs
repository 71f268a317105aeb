use thiserror::Error;

use ud_core::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BehaviorError {
    #[error("{archetype} behavior needs at least one establishment in its round")]
    EmptyRound { archetype: &'static str },

    #[error("no feasible route from {from} to {to}")]
    RouteConstruction { from: NodeId, to: NodeId },
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
