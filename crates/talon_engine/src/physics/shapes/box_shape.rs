//! Box collision shape

use crate::foundation::math::{Trs, Vec3};
use crate::scene::TransformKey;

/// An oriented box with a cached world-space axis-aligned fit
///
/// Local bounds are fixed at construction; [`BoxShape::transform`] rotates
/// and scales the eight corners into world space and recomputes a tight
/// axis-aligned min/max over them. With `ignore_rotation` set the world
/// bounds are just the local bounds translated to the owner's position.
#[derive(Debug, Clone)]
pub struct BoxShape {
    min: Vec3,
    max: Vec3,
    vertices: [Vec3; Self::VERTEX_COUNT],
    world_vertices: [Vec3; Self::VERTEX_COUNT],
    world_min: Vec3,
    world_max: Vec3,
    center: Vec3,
    ignore_rotation: bool,
    owner: Option<TransformKey>,
}

impl BoxShape {
    /// Number of corner vertices
    pub const VERTEX_COUNT: usize = 8;

    /// Create a box from local-space min/max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        let mut shape = Self {
            min: Vec3::zeros(),
            max: Vec3::zeros(),
            vertices: [Vec3::zeros(); Self::VERTEX_COUNT],
            world_vertices: [Vec3::zeros(); Self::VERTEX_COUNT],
            world_min: Vec3::zeros(),
            world_max: Vec3::zeros(),
            center: Vec3::zeros(),
            ignore_rotation: false,
            owner: None,
        };
        shape.set_bounds(min, max);
        shape
    }

    /// Create a box from a center and per-axis half extents
    pub fn from_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self::new(center - half_extent, center + half_extent)
    }

    /// Replace the local bounds and reset cached world data
    pub fn set_bounds(&mut self, min: Vec3, max: Vec3) {
        self.min = min;
        self.world_min = min;
        self.max = max;
        self.world_max = max;
        self.reset_vertices();
        self.world_vertices = self.vertices;
    }

    fn reset_vertices(&mut self) {
        let (min, max) = (self.min, self.max);
        self.vertices[0] = min;
        self.vertices[1] = Vec3::new(min.x, min.y, max.z);
        self.vertices[2] = Vec3::new(min.x, max.y, min.z);
        self.vertices[3] = Vec3::new(max.x, min.y, min.z);
        self.vertices[4] = Vec3::new(min.x, max.y, max.z);
        self.vertices[5] = Vec3::new(max.x, min.y, max.z);
        self.vertices[6] = Vec3::new(max.x, max.y, min.z);
        self.vertices[7] = max;
    }

    /// World-space corner by index (valid after [`BoxShape::transform`])
    pub fn world_vertex(&self, index: usize) -> Vec3 {
        self.world_vertices[index]
    }

    /// World-space axis-aligned minimum corner
    pub fn world_min(&self) -> Vec3 {
        self.world_min
    }

    /// World-space axis-aligned maximum corner
    pub fn world_max(&self) -> Vec3 {
        self.world_max
    }

    /// World-space center (the owner's position)
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Half extent of the world-space fit, measured from center to max
    pub fn half_extent(&self) -> Vec3 {
        self.world_max - self.center
    }

    /// Skip the per-corner rotation path in [`BoxShape::transform`]
    pub fn set_ignore_rotation(&mut self, ignore: bool) {
        self.ignore_rotation = ignore;
    }

    /// The transform node this shape follows, if assigned
    pub fn owner(&self) -> Option<TransformKey> {
        self.owner
    }

    /// Assign the transform node this shape follows
    pub fn set_owner(&mut self, owner: Option<TransformKey>) {
        self.owner = owner;
    }

    /// Recompute world-space corners and the axis-aligned fit from a pose
    pub fn transform(&mut self, pose: &Trs) {
        self.center = pose.position;

        if self.ignore_rotation {
            self.world_min = self.min + self.center;
            self.world_max = self.max + self.center;
            return;
        }

        self.reset_vertices();

        self.world_min = Vec3::repeat(f32::INFINITY);
        self.world_max = Vec3::repeat(f32::NEG_INFINITY);

        for (world, local) in self.world_vertices.iter_mut().zip(&self.vertices) {
            *world = pose.rotation * local.component_mul(&pose.scale) + pose.position;
        }

        for point in &self.world_vertices {
            for axis in 0..3 {
                if point[axis] < self.world_min[axis] {
                    self.world_min[axis] = point[axis];
                }
                if point[axis] > self.world_max[axis] {
                    self.world_max[axis] = point[axis];
                }
            }
        }
    }

    /// Cast a ray against the world-space axis-aligned fit (slab method)
    ///
    /// Per-axis reciprocal direction, entry = max of per-axis entries, exit
    /// = min of per-axis exits. Fails when the exit is behind the start or
    /// the entry overtakes the exit. Returns `start + entry * direction`.
    pub fn raycast(&self, start: Vec3, direction: Vec3) -> Option<Vec3> {
        let frac = Vec3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z);

        let to_min_x = (self.world_min.x - start.x) * frac.x;
        let to_max_x = (self.world_max.x - start.x) * frac.x;

        let to_min_y = (self.world_min.y - start.y) * frac.y;
        let to_max_y = (self.world_max.y - start.y) * frac.y;

        let to_min_z = (self.world_min.z - start.z) * frac.z;
        let to_max_z = (self.world_max.z - start.z) * frac.z;

        let entry = to_min_x
            .min(to_max_x)
            .max(to_min_y.min(to_max_y))
            .max(to_min_z.min(to_max_z));
        let exit = to_min_x
            .max(to_max_x)
            .min(to_min_y.max(to_max_y))
            .min(to_min_z.max(to_max_z));

        if exit < 0.0 {
            return None;
        }

        if entry > exit {
            return None;
        }

        Some(start + direction * entry)
    }
}
