use thiserror::Error;

#[derive(Error, Debug)]
pub enum MctsError {
    #[error("Board error: {0}")]
    Board(#[from] othello_core::BoardError),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] othello_nn::NnError),

    #[error("Terminal position cannot be searched")]
    TerminalPosition,

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Root node not initialized")]
    RootNotInitialized,

    #[error("NN evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Dirichlet sampling error: {0}")]
    DirichletError(String),
}

pub type Result<T> = std::result::Result<T, MctsError>;
