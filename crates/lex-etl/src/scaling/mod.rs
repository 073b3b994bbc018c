//! Scaling module for numeric columns.

mod standard;

pub use standard::{ColumnScaling, ScalingReport, ScalingStats, StandardScaler, standardize};
