//! Circle diagram layout.
//!
//! # Responsibility
//! - Place child circles and roles inside a parent circle without overlap.
//! - Produce readable label lines for SVG text elements.
//!
//! # Invariants
//! - Every function here is pure: identical input yields identical output.
//! - Nothing here fails; degenerate input yields empty or zero-sized output.

pub mod pack;
pub mod text;
