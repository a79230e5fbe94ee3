//! Adaptive Signal Simulation Library
//!
//! A four-approach intersection whose signals are scheduled from live queue
//! lengths, with override priority for emergency vehicles.

pub mod render;
pub mod runtime;
pub mod simulation;
