//! Spotify-to-Plex track matching library - shared modules for all binaries.

pub mod matcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod safety;
pub mod scoring;
pub mod search;
pub mod sync;
