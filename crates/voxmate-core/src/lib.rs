//! Voxmate core: conversation model, sessions, status indicators, config.
//!
//! Everything here is front-end agnostic: state changes are reported as
//! [`events::ViewEvent`]s through an [`events::EventSink`].

pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod settings;
pub mod status;
pub mod types;
pub mod utils;
pub mod view;

pub use error::{VoxError, VoxResult};
