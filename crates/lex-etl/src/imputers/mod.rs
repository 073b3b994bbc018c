//! Imputation module for handling missing values.
//!
//! Only mean imputation of numeric columns is provided.

mod mean;

pub use mean::{
    ColumnImputation, ImputationReport, ImputationStats, MeanImputer, column_mean, fill_missing,
};
