//! Scene module - hierarchical transforms
//!
//! Provides the arena-backed transform hierarchy that every simulated
//! entity (including cameras) hangs off of. Physics components reference
//! nodes by [`TransformKey`] and read/write world-space state through the
//! hierarchy.

mod hierarchy;

pub use hierarchy::{
    HierarchyError, ReparentMode, Space, TransformEvent, TransformEventKind, TransformHierarchy,
    TransformKey,
};
