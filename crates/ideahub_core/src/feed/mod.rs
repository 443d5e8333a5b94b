//! Feed and roadmap projection entry points.
//!
//! # Responsibility
//! - Expose read-only query APIs composing ideas and roadmap updates for
//!   display.
//! - Keep ordering and filter rules inside core.

pub mod composer;
