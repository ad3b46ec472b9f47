//! Collision shape variants
//!
//! Geometric primitives transformed into world space each frame. A shape's
//! cached world-space data is only valid after [`Shape::transform`] has run
//! for the current frame.

mod box_shape;
mod terrain;
mod triangle;

pub use box_shape::BoxShape;
pub use terrain::Terrain;
pub use triangle::Triangle;

use crate::foundation::math::{Trs, Vec3};
use crate::scene::TransformKey;

/// Closed set of collision shape kinds
///
/// The resolution dispatcher matches exhaustively on this enum, so adding a
/// variant is a compile-visible change everywhere shapes are tested.
#[derive(Debug, Clone)]
pub enum Shape {
    /// An oriented box tested through its world-space AABB
    Box(BoxShape),
    /// A single triangle
    Triangle(Triangle),
    /// A static triangle soup
    Terrain(Terrain),
}

impl Shape {
    /// Recompute cached world-space data from the owner's pose
    pub fn transform(&mut self, pose: &Trs) {
        match self {
            Self::Box(shape) => shape.transform(pose),
            Self::Triangle(shape) => shape.transform(pose),
            Self::Terrain(shape) => shape.transform(pose),
        }
    }

    /// Cast a ray against the world-space shape
    ///
    /// Returns the hit point, or `None` for a miss or degenerate geometry.
    pub fn raycast(&self, start: Vec3, direction: Vec3) -> Option<Vec3> {
        match self {
            Self::Box(shape) => shape.raycast(start, direction),
            Self::Triangle(shape) => shape.raycast(start, direction),
            Self::Terrain(shape) => shape.raycast(start, direction),
        }
    }

    /// The transform node this shape follows, if assigned
    pub fn owner(&self) -> Option<TransformKey> {
        match self {
            Self::Box(shape) => shape.owner(),
            Self::Triangle(shape) => shape.owner(),
            Self::Terrain(shape) => shape.owner(),
        }
    }

    /// Assign the transform node this shape follows
    pub fn set_owner(&mut self, owner: Option<TransformKey>) {
        match self {
            Self::Box(shape) => shape.set_owner(owner),
            Self::Triangle(shape) => shape.set_owner(owner),
            Self::Terrain(shape) => shape.set_owner(owner),
        }
    }

    /// Downcast to a box shape
    pub fn as_box(&self) -> Option<&BoxShape> {
        match self {
            Self::Box(shape) => Some(shape),
            _ => None,
        }
    }
}
