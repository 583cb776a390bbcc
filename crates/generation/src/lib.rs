//! `shopreel-generation`
//!
//! **Responsibility:** boundary to the external generative image/video provider.
//!
//! This crate is intentionally **not** aware of jobs:
//! - It turns a prompt plus options into media, or an error.
//! - It classifies provider errors as transient or permanent.
//! - It owns the bounded poll loop for providers that answer with an operation handle.

pub mod client;
pub mod error;
pub mod media;
pub mod polling;
pub mod request;
pub mod stub;

pub use client::{GenerationClient, OperationClient, OperationHandle, OperationStatus};
pub use error::GenerationError;
pub use media::{GeneratedMedia, MediaKind};
pub use polling::{PollConfig, PollingClient};
pub use request::{AspectRatio, GenerationOptions, GenerationRequest, ReferenceImage, Resolution};
pub use stub::StubProvider;
