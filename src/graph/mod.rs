//! The audio-graph boundary the synth core drives.
//!
//! `engine` defines the `AudioEngine` trait: node creation, wiring, source
//! lifecycle and parameter automation. `offline` provides `OfflineGraph`, an
//! in-process implementation that renders blocks on demand and is what the
//! terminal front-end runs inside its audio callback.

/// The `AudioEngine` trait.
pub mod engine;
/// Node handles, parameter kinds and the render context.
pub mod node;
/// Block-rendering reference engine.
pub mod offline;

pub use engine::AudioEngine;
pub use node::{NodeId, ParamKind, PlaybackState, RenderCtx};
pub use offline::OfflineGraph;
