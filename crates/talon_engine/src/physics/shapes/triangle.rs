//! Triangle collision shape

use crate::foundation::math::{Trs, Vec3};
use crate::scene::TransformKey;

// Rejects rays running nearly parallel to the tested plane.
const PARALLEL_EPSILON: f32 = 1e-4;

/// A triangle with cached world-space vertices and normal
///
/// The cached normal is the raw cross product of the world-space edges:
/// its length scales with the triangle's area, callers must not assume it
/// is normalized.
#[derive(Debug, Clone)]
pub struct Triangle {
    vertices: [Vec3; 3],
    world_vertices: [Vec3; 3],
    normal: Vec3,
    owner: Option<TransformKey>,
}

impl Triangle {
    /// Create a triangle from three local-space vertices
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        let vertices = [v0, v1, v2];
        let mut triangle = Self {
            vertices,
            world_vertices: vertices,
            normal: Vec3::zeros(),
            owner: None,
        };
        triangle.recompute_normal();
        triangle
    }

    fn recompute_normal(&mut self) {
        let edge1 = self.world_vertices[1] - self.world_vertices[0];
        let edge2 = self.world_vertices[2] - self.world_vertices[0];
        self.normal = edge1.cross(&edge2);
    }

    /// World-space vertex by index (valid after [`Triangle::transform`])
    pub fn world_vertex(&self, index: usize) -> Vec3 {
        self.world_vertices[index]
    }

    /// Cached world-space normal (unnormalized)
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// The transform node this shape follows, if assigned
    pub fn owner(&self) -> Option<TransformKey> {
        self.owner
    }

    /// Assign the transform node this shape follows
    pub fn set_owner(&mut self, owner: Option<TransformKey>) {
        self.owner = owner;
    }

    /// Recompute world-space vertices and normal from a pose
    pub fn transform(&mut self, pose: &Trs) {
        for (world, local) in self.world_vertices.iter_mut().zip(&self.vertices) {
            *world = pose.rotation * local.component_mul(&pose.scale) + pose.position;
        }
        self.recompute_normal();
    }

    /// Whether a point's horizontal (X-Z) projection lies inside the triangle
    ///
    /// Half-plane sign tests against the three projected edges; points on
    /// an edge count as inside. The point's Y is irrelevant, which is what
    /// "is this box corner above/below the triangle surface" needs.
    pub fn point_inside_projection(&self, point: Vec3) -> bool {
        fn edge_sign(p: Vec3, a: Vec3, b: Vec3) -> f32 {
            (p.x - b.x) * (a.z - b.z) - (a.x - b.x) * (p.z - b.z)
        }

        let [v0, v1, v2] = self.world_vertices;
        let d0 = edge_sign(point, v0, v1);
        let d1 = edge_sign(point, v1, v2);
        let d2 = edge_sign(point, v2, v0);

        let has_negative = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
        let has_positive = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;
        !(has_negative && has_positive)
    }

    /// Height of the triangle's plane under/over a point's X-Z location
    ///
    /// Solves the plane equation for Y. Degenerates to a non-finite value
    /// for a vertical triangle (normal with zero Y).
    pub fn surface_height_at(&self, point: Vec3) -> f32 {
        let v0 = self.world_vertices[0];
        let n = self.normal;
        v0.y - (n.x * (point.x - v0.x) + n.z * (point.z - v0.z)) / n.y
    }

    /// Cast a ray against the triangle
    ///
    /// Ray-plane intersection with near-parallel and behind-origin
    /// rejection, followed by same-side edge tests against the normal.
    pub fn raycast(&self, start: Vec3, direction: Vec3) -> Option<Vec3> {
        let [v0, v1, v2] = self.world_vertices;
        let normal = self.normal.normalize();

        let denominator = normal.dot(&direction);
        if denominator.abs() <= PARALLEL_EPSILON {
            return None;
        }

        let distance = (v0 - start).dot(&normal) / denominator;
        if distance < 0.0 {
            return None;
        }

        let point = start + direction * distance;

        // Same-side tests: the hit must lie left of every edge as seen
        // along the normal.
        for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
            if normal.dot(&(b - a).cross(&(point - a))) < 0.0 {
                return None;
            }
        }

        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Quat;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn ground_triangle() -> Triangle {
        // CCW seen from above: normal points up.
        Triangle::new(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(10.0, 0.0, -10.0),
        )
    }

    #[test]
    fn test_normal_is_unnormalized_cross_product() {
        let triangle = ground_triangle();
        let normal = triangle.normal();

        // Edges (10,0,20) x (20,0,0) = (0,400,-... ) -- direction up, length
        // twice the area.
        assert!(normal.y > 0.0);
        assert_relative_eq!(normal.normalize(), Vec3::new(0.0, 1.0, 0.0), epsilon = EPSILON);
        assert!((normal.magnitude() - 1.0).abs() > 1.0);
    }

    #[test]
    fn test_transform_moves_vertices_and_normal() {
        let mut triangle = ground_triangle();
        let pose = Trs::new(
            Vec3::new(0.0, 5.0, 0.0),
            Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
            Vec3::new(1.0, 1.0, 1.0),
        );
        triangle.transform(&pose);

        // Rotated 90° around Z: the up normal now points along -X.
        assert_relative_eq!(
            triangle.normal().normalize(),
            Vec3::new(-1.0, 0.0, 0.0),
            epsilon = 1e-4
        );
        assert_relative_eq!(
            triangle.world_vertex(0),
            Vec3::new(0.0, -5.0, -10.0),
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_point_inside_projection() {
        let triangle = ground_triangle();

        // Y is ignored by the projection test.
        assert!(triangle.point_inside_projection(Vec3::new(0.0, 100.0, 0.0)));
        assert!(triangle.point_inside_projection(Vec3::new(-2.0, -5.0, -3.0)));
        assert!(!triangle.point_inside_projection(Vec3::new(11.0, 0.0, 0.0)));
        assert!(!triangle.point_inside_projection(Vec3::new(0.0, 0.0, 11.0)));
        // Apex vertex is on the boundary.
        assert!(triangle.point_inside_projection(Vec3::new(0.0, 0.0, 10.0)));
    }

    #[test]
    fn test_surface_height_on_slope() {
        // Plane rising from y=0 at z=-10 to y=4 at z=10.
        let triangle = Triangle::new(
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(0.0, 4.0, 10.0),
            Vec3::new(10.0, 0.0, -10.0),
        );

        assert_relative_eq!(
            triangle.surface_height_at(Vec3::new(0.0, 50.0, -10.0)),
            0.0,
            epsilon = 1e-4
        );
        assert_relative_eq!(
            triangle.surface_height_at(Vec3::new(3.0, -2.0, 0.0)),
            2.0,
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_raycast_hits_from_above() {
        let triangle = ground_triangle();

        let hit = triangle
            .raycast(Vec3::new(1.0, 5.0, -1.0), Vec3::new(0.0, -1.0, 0.0))
            .expect("ray should hit");
        assert_relative_eq!(hit, Vec3::new(1.0, 0.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_raycast_rejects_outside_hit() {
        let triangle = ground_triangle();

        assert!(triangle
            .raycast(Vec3::new(9.0, 5.0, 9.0), Vec3::new(0.0, -1.0, 0.0))
            .is_none());
    }

    #[test]
    fn test_raycast_rejects_parallel_ray() {
        let triangle = ground_triangle();

        assert!(triangle
            .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0))
            .is_none());
    }

    #[test]
    fn test_raycast_rejects_behind_origin() {
        let triangle = ground_triangle();

        assert!(triangle
            .raycast(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 1.0, 0.0))
            .is_none());
    }
}
