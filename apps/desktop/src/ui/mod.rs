//! Terminal presentation of session state.

pub mod render;
