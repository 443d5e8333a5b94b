//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `ideahub_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("ideahub_core ping={}", ideahub_core::ping());
    println!("ideahub_core version={}", ideahub_core::core_version());
}
