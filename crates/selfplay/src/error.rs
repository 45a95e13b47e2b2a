use thiserror::Error;

use crate::cycle::CycleStage;

#[derive(Error, Debug)]
pub enum SelfPlayError {
    #[error("Corrupt training example at index {index}: {reason}")]
    CorruptTrainingBuffer { index: usize, reason: String },

    #[error("Self-play worker panicked")]
    WorkerPanicked,
}

/// Failure of one stage of the training cycle
#[derive(Error, Debug)]
#[error("Cycle {cycle} failed during {stage}: {source}")]
pub struct CycleError {
    pub cycle: usize,
    pub stage: CycleStage,
    #[source]
    pub source: anyhow::Error,
}

impl CycleError {
    pub fn new(cycle: usize, stage: CycleStage, source: impl Into<anyhow::Error>) -> Self {
        Self {
            cycle,
            stage,
            source: source.into(),
        }
    }
}
