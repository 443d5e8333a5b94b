//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own the caller-facing error taxonomy (ownership, state preconditions,
//!   graph-edge rules).

pub mod idea_service;
pub mod social_service;
