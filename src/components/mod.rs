//! Reusable UI components.

pub mod lineage;
