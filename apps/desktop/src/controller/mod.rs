//! Controller layer: UI events, error modeling, and shell command orchestration.

pub mod events;
pub mod orchestration;
