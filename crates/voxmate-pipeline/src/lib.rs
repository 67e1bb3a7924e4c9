//! Voxmate Pipeline: one conversational turn, end to end.
//!
//! This crate contains:
//! - **pipeline**: the `send` state machine (chat, then optional speech)
//! - **audio**: exclusive ownership of the single playable audio resource

pub mod audio;
pub mod pipeline;

pub use audio::{AudioClip, AudioLease, AudioPlayer, AudioSlot};
pub use pipeline::{
    Collaborators, MessagePipeline, PipelineState, RejectReason, SendOutcome, SpeechOutcome,
    FALLBACK_REPLY,
};
