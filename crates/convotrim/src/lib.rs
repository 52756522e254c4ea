//! Conversation context optimization: pick what a model call should see

pub mod linked;
pub mod optimizer;

pub use linked::optimize_linked;
pub use optimizer::{
    ContextOptimizer, Diagnostics, OptimizationRequest, OptimizationResult, Selection,
};
