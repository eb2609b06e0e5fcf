//! Pure transformations of a filtered [`Table`](crate::data::model::Table).
//!
//! Every function here takes the table by reference and returns a fresh
//! value; nothing is cached or shared between calls.

pub mod aggregate;
pub mod correlation;
pub mod distribution;
pub mod encoding;
pub mod projection;
