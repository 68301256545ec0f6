//! A navigable starfield for the terminal: drifting stars, linked and labelled
//! constellations, and a camera that pans across a wrapping world.

pub mod color;
pub mod config;
pub mod effects;
pub mod error;
pub mod surface;
pub mod terminal;

pub use config::Config;
pub use error::{Result, StarchartError};
