//! Derived circle hierarchy views.
//!
//! # Responsibility
//! - Rebuild the nested circle tree from flat circle/role records.
//! - Provide lookups used by drill-down navigation.
//!
//! # Invariants
//! - Trees are rebuilt on every call; no cached tree is mutated in place.

pub mod circle_tree;
