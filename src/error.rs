use thiserror::Error;

use crate::scheduler::ChallengeKind;

/// Errors raised by the session engine.
///
/// None of these end the process. `InvalidTransition` is expected whenever a stray
/// event reaches the engine after the challenge it was aimed at already resolved.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no handler for {event} during {}", kind.map_or("idle session".to_string(), |k| k.to_string()))]
    InvalidTransition {
        event: &'static str,
        kind: Option<ChallengeKind>,
    },

    #[error("no hazard-free spawn found after {attempts} attempts")]
    GeometryExhausted { attempts: usize },

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Failures while writing the result log to disk
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("there are no results to export")]
    Empty,

    #[error("could not write export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not format results: {0}")]
    Csv(#[from] csv::Error),
}
