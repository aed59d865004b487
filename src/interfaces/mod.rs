//! File formats read and written by the batch binary.

pub mod csv;
pub mod json;
