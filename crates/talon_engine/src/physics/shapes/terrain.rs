//! Terrain collision shape

use crate::foundation::math::{Trs, Vec3};
use crate::scene::TransformKey;

use super::Triangle;

/// A static triangle soup, typically a walkable ground mesh
///
/// The triangle set is fixed at construction. Transforming a terrain
/// delegates to every triangle.
#[derive(Debug, Clone)]
pub struct Terrain {
    triangles: Vec<Triangle>,
    owner: Option<TransformKey>,
}

impl Terrain {
    /// Create a terrain from its triangles
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self {
            triangles,
            owner: None,
        }
    }

    /// The terrain's triangles
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// The transform node this shape follows, if assigned
    pub fn owner(&self) -> Option<TransformKey> {
        self.owner
    }

    /// Assign the transform node this shape follows
    pub fn set_owner(&mut self, owner: Option<TransformKey>) {
        self.owner = owner;
    }

    /// Recompute world-space data for every triangle
    pub fn transform(&mut self, pose: &Trs) {
        for triangle in &mut self.triangles {
            triangle.transform(pose);
        }
    }

    /// Cast a ray against every triangle, keeping the nearest hit
    ///
    /// Nearest is measured by Euclidean distance from the ray start.
    pub fn raycast(&self, start: Vec3, direction: Vec3) -> Option<Vec3> {
        let mut nearest: Option<Vec3> = None;
        let mut nearest_distance = f32::INFINITY;

        for triangle in &self.triangles {
            if let Some(point) = triangle.raycast(start, direction) {
                let distance = (point - start).magnitude();
                if distance < nearest_distance {
                    nearest_distance = distance;
                    nearest = Some(point);
                }
            }
        }

        nearest
    }
}
