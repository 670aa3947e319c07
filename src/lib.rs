//! Engrave - adaptive screening of continuous-tone images
//!
//! A raw scanline stream is pushed through a chain of filter stages. Each
//! stage classifies the local geometry of every pixel, writes tile and tone
//! artifacts per colorant and forwards the background it leaves behind.
//! The orchestrator finally merges the artifacts into one EPS document or
//! a set of PNG planes. The library is exposed for the integration tests.

pub mod artifact;
pub mod cleanup;
pub mod cli;
pub mod codec;
pub mod error;
pub mod inspect;
pub mod models;
pub mod pipeline;
pub mod stage;
