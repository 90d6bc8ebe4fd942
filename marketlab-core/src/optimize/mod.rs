//! Parameter optimization — grid search with a train/validation split.

pub mod grid;
pub mod optimizer;

pub use grid::ParameterGrid;
pub use optimizer::{
    OptimizationBaseline, OptimizationProgress, OptimizationResult, OptimizationStage,
    OptimizeError, Optimizer, TRAIN_FRACTION,
};
