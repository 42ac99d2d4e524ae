//! Index errors for the per-axis and per-corner value types.

use thiserror::Error;

/// An integer could not be converted into an [`Axis`](crate::Axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("axis index {0} is out of range (expected 0, 1 or 2)")]
pub struct AxisIndexError(pub usize);

/// An integer could not be converted into a [`CornerIndex`](crate::CornerIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("corner index {0} is out of range (expected 1..=8)")]
pub struct CornerIndexError(pub i64);
