//! Minimal policy/value predictor used as the search evaluator.
//!
//! Parameters are persisted as plain `.npy` files so an external trainer can
//! read and replace them.

mod error;
mod model;
mod train;

pub use error::{NnError, Result};
pub use model::NnModel;
pub use train::{softmax_rows, Loss};
