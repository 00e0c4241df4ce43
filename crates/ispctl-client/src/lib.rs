//! Typed ISP feature operations over the control channel.
//!
//! The driver's de-facto protocol is a small vocabulary of JSON request
//! shapes selected by an `id` string. This crate encodes that vocabulary as
//! tagged request variants, one per selector, so a request with a missing
//! or misspelled field cannot be constructed, and decodes each reply into a
//! per-operation struct so a response missing its documented field surfaces
//! as a protocol error rather than a silent default.

pub mod client;
pub mod error;
pub mod message;

pub use client::FeatureClient;
pub use error::{ClientError, Result};
pub use message::{
    identity_matrix, ColorOffset, DewarpFlags, Request, WbConfig, WbGains, DEFAULT_STREAM_ID,
};
