//! Chat-completion provider implementations for loopclaw.
//!
//! All providers implement the `loopclaw_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
