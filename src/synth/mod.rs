// Purpose: slot bank, voice lifecycle, note control
// This layer drives an AudioEngine; it never renders samples itself

pub mod config;
pub mod controller;
pub mod factory;
pub mod filter_chain;
pub mod message;
pub mod slot;
pub mod updater;
pub mod voice;
