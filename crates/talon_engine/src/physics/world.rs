//! Physics world: shape registry and intersection tests
//!
//! The registry is an explicit context object owned by the caller rather
//! than process-wide state, so multiple isolated simulations can coexist
//! and tests never need a global reset.
//!
//! The intersection tests are stateless functions over already-transformed
//! shape data. Callers are responsible for calling `transform` on a shape
//! before testing it; nothing here refreshes world-space caches.

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::config::SimulationConfig;
use crate::foundation::math::Vec3;

use super::shapes::{BoxShape, Shape, Terrain, Triangle};
use super::Face;

slotmap::new_key_type! {
    /// Stable handle to a shape registered in a [`PhysicsWorld`]
    pub struct ShapeKey;
}

/// A ray for casting against registered shapes
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (should be normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }
}

/// Result of a ray cast against the registry
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// The point of intersection in world space
    pub point: Vec3,
    /// The shape that was hit
    pub shape: ShapeKey,
}

/// Result of a box-box intersection test
#[derive(Debug, Clone, Copy)]
pub struct BoxBoxHit {
    /// Correction that separates the first box from the second along one axis
    pub translation: Vec3,
    /// Signed axis the correction acts along
    pub face: Face,
}

/// Strategy for the box-triangle intersection test
///
/// `Literal` stops after the first box corner examined, preserving the
/// long-standing resolution behavior existing gameplay is tuned against.
/// `ScanAllVertices` examines all eight corners and keeps the largest
/// correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriangleResolution {
    /// Reproduce the first-vertex early return
    #[default]
    Literal,
    /// Examine all eight box corners
    ScanAllVertices,
}

/// Insertion-ordered registry of live collision shapes
///
/// Shapes are added and removed explicitly by components on load/unload.
/// There is no duplicate guard beyond caller discipline.
#[derive(Debug)]
pub struct PhysicsWorld {
    shapes: SlotMap<ShapeKey, Shape>,
    order: Vec<ShapeKey>,
    gravity: f32,
    triangle_resolution: TriangleResolution,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a world with default settings
    pub fn new() -> Self {
        Self::from_config(&SimulationConfig::default())
    }

    /// Create a world from simulation settings
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            shapes: SlotMap::with_key(),
            order: Vec::new(),
            gravity: config.gravity,
            triangle_resolution: config.triangle_resolution,
        }
    }

    /// Current gravity acceleration (units/s², negative is down)
    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Set gravity acceleration
    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    /// Current box-triangle resolution strategy
    pub fn triangle_resolution(&self) -> TriangleResolution {
        self.triangle_resolution
    }

    /// Set the box-triangle resolution strategy
    pub fn set_triangle_resolution(&mut self, mode: TriangleResolution) {
        self.triangle_resolution = mode;
    }

    /// Register a shape, returning its key
    pub fn add(&mut self, shape: Shape) -> ShapeKey {
        let key = self.shapes.insert(shape);
        self.order.push(key);
        log::debug!("registered shape {key:?} ({} total)", self.order.len());
        key
    }

    /// Unregister a shape
    pub fn remove(&mut self, key: ShapeKey) -> Option<Shape> {
        let shape = self.shapes.remove(key);
        if shape.is_some() {
            self.order.retain(|&k| k != key);
            log::debug!("removed shape {key:?} ({} total)", self.order.len());
        }
        shape
    }

    /// Whether a key refers to a registered shape
    pub fn contains(&self, key: ShapeKey) -> bool {
        self.shapes.contains_key(key)
    }

    /// Number of registered shapes
    pub fn shape_count(&self) -> usize {
        self.order.len()
    }

    /// Key of the shape at an insertion-order index
    pub fn key_at(&self, index: usize) -> Option<ShapeKey> {
        self.order.get(index).copied()
    }

    /// Shape at an insertion-order index
    pub fn shape_at(&self, index: usize) -> Option<&Shape> {
        self.key_at(index).and_then(|key| self.shapes.get(key))
    }

    /// Shape by key
    pub fn shape(&self, key: ShapeKey) -> Option<&Shape> {
        self.shapes.get(key)
    }

    /// Mutable shape by key
    pub fn shape_mut(&mut self, key: ShapeKey) -> Option<&mut Shape> {
        self.shapes.get_mut(key)
    }

    /// Keys of all registered shapes, in insertion order
    pub fn keys(&self) -> impl Iterator<Item = ShapeKey> + '_ {
        self.order.iter().copied()
    }

    /// Cast a ray against every registered shape, keeping the nearest hit
    pub fn raycast(&self, ray: &Ray) -> Option<RayHit> {
        let mut nearest: Option<RayHit> = None;
        let mut nearest_distance = f32::INFINITY;

        for &key in &self.order {
            if let Some(point) = self.shapes[key].raycast(ray.origin, ray.direction) {
                let distance = (point - ray.origin).magnitude();
                if distance < nearest_distance {
                    nearest_distance = distance;
                    nearest = Some(RayHit { point, shape: key });
                }
            }
        }

        nearest
    }
}

/// Three-valued sign: -1, 0, or +1
fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Test two boxes' world-space axis-aligned fits for overlap
///
/// Per-axis `separation = |delta| - (half_a + half_b)`; the boxes overlap
/// iff all three separations are negative. Exactly one axis is resolved
/// per call: the one whose separation value is strictly greatest, with the
/// correction signed to push `a` away from `b`. With an exact tie between
/// the leading axes no axis qualifies and the hit carries a zero
/// translation and `Face::None`.
pub fn box_box_intersection(a: &BoxShape, b: &BoxShape) -> Option<BoxBoxHit> {
    let delta = b.center() - a.center();
    let separation = delta.abs() - (a.half_extent() + b.half_extent());

    if !(separation.x < 0.0 && separation.y < 0.0 && separation.z < 0.0) {
        return None;
    }

    let mut translation = Vec3::zeros();
    let mut face = Face::None;

    if separation.x > separation.y && separation.x > separation.z {
        let s = sign(delta.x);
        translation.x = separation.x * s;
        face = Face::from_x(s);
    }

    if separation.y > separation.x && separation.y > separation.z {
        let s = sign(delta.y);
        translation.y = separation.y * s;
        face = Face::from_y(s);
    }

    if separation.z > separation.y && separation.z > separation.x {
        let s = sign(delta.z);
        translation.z = separation.z * s;
        face = Face::from_z(s);
    }

    Some(BoxBoxHit { translation, face })
}

/// Ray-plane intersection distance
///
/// Rejects rays nearly parallel to the plane and hits behind the origin.
/// The plane normal need not be normalized.
pub fn raycast_plane(
    start: Vec3,
    direction: Vec3,
    plane_origin: Vec3,
    plane_normal: Vec3,
) -> Option<f32> {
    const MINIMAL_DOT: f32 = 1e-4;

    let denominator = plane_normal.dot(&direction);
    if denominator.abs() <= MINIMAL_DOT {
        return None;
    }

    let distance = (plane_origin - start).dot(&plane_normal) / denominator;
    if distance >= 0.0 {
        Some(distance)
    } else {
        None
    }
}

/// Examine one box corner against a triangle, returning its correction
///
/// The corner must project inside the triangle horizontally. The surface
/// height under the corner decides the above/below side; a ray anchored at
/// the first adjacent corner (from it when below, from the corner itself
/// when above) is cast against the triangle's plane, and on a hit the
/// correction snaps the corner's Y to the surface height. Only the first
/// adjacent corner is ever consulted.
fn box_vertex_correction(box_shape: &BoxShape, triangle: &Triangle, index: usize) -> Option<Vec3> {
    let a_point = box_shape.world_vertex(index);
    if !triangle.point_inside_projection(a_point) {
        return None;
    }

    let surface_height = triangle.surface_height_at(a_point);
    let side = sign(a_point.y - surface_height);

    for b in 0..BoxShape::VERTEX_COUNT {
        if b == index {
            continue;
        }

        let b_point = box_shape.world_vertex(b);
        let ray_start = if side >= 0.0 { a_point } else { b_point };
        let ray_direction = (a_point - b_point).normalize() * side;

        let hit = raycast_plane(
            ray_start,
            ray_direction,
            triangle.world_vertex(0),
            triangle.normal(),
        );
        let hit_point = Vec3::new(a_point.x, surface_height, a_point.z);

        return hit.map(|_| a_point - hit_point);
    }

    None
}

/// Test a box against a triangle
///
/// Per-corner projection containment plus a plane raycast decide the hit;
/// the returned correction is vertical, snapping the deepest qualifying
/// corner to the triangle surface. `Literal` mode stops after the first
/// corner examined, whether or not it qualified.
pub fn box_triangle_intersection(
    box_shape: &BoxShape,
    triangle: &Triangle,
    mode: TriangleResolution,
) -> Option<Vec3> {
    let mut min_translation = Vec3::zeros();
    let mut intersects = false;

    for index in 0..BoxShape::VERTEX_COUNT {
        if let Some(correction) = box_vertex_correction(box_shape, triangle, index) {
            intersects = true;
            if correction.magnitude() > min_translation.magnitude() {
                min_translation = correction;
            }
        }

        if mode == TriangleResolution::Literal {
            break;
        }
    }

    intersects.then_some(min_translation)
}

/// Test a box against every triangle of a terrain
///
/// Accumulates the largest-magnitude correction across all per-triangle
/// hits.
pub fn box_terrain_intersection(
    box_shape: &BoxShape,
    terrain: &Terrain,
    mode: TriangleResolution,
) -> Option<Vec3> {
    let mut min_translation = Vec3::zeros();
    let mut intersects = false;

    for triangle in terrain.triangles() {
        if let Some(correction) = box_triangle_intersection(box_shape, triangle, mode) {
            intersects = true;
            if correction.magnitude() > min_translation.magnitude() {
                min_translation = correction;
            }
        }
    }

    intersects.then_some(min_translation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Trs;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn unit_box_at(position: Vec3) -> BoxShape {
        let mut shape = BoxShape::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        shape.transform(&Trs::from_position(position));
        shape
    }

    #[test]
    fn test_box_box_offset_overlap_scenario() {
        // Unit boxes at the origin and (1.5, 0, 0): 0.5 of overlap on X.
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::new(1.5, 0.0, 0.0));

        let hit = box_box_intersection(&a, &b).expect("boxes overlap");
        assert_relative_eq!(hit.translation, Vec3::new(-0.5, 0.0, 0.0), epsilon = EPSILON);
        assert_eq!(hit.face, Face::Left);
    }

    #[test]
    fn test_box_box_symmetry() {
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::new(1.5, 0.0, 0.0));

        let ab = box_box_intersection(&a, &b).expect("boxes overlap");
        let ba = box_box_intersection(&b, &a).expect("boxes overlap");

        assert_relative_eq!(ab.translation, -ba.translation, epsilon = EPSILON);
        assert_eq!(ab.face, Face::Left);
        assert_eq!(ba.face, Face::Right);
    }

    #[test]
    fn test_box_box_no_overlap() {
        let a = unit_box_at(Vec3::zeros());
        // Separated on X only; one positive separation is enough.
        let b = unit_box_at(Vec3::new(2.5, 0.0, 0.0));

        assert!(box_box_intersection(&a, &b).is_none());

        let c = unit_box_at(Vec3::new(2.5, 2.5, 2.5));
        assert!(box_box_intersection(&a, &c).is_none());
    }

    #[test]
    fn test_box_box_touching_is_no_overlap() {
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::new(2.0, 0.0, 0.0));

        assert!(box_box_intersection(&a, &b).is_none());
    }

    #[test]
    fn test_box_box_resolves_least_penetrated_axis() {
        // Overlaps 1.5 on X, 0.2 on Y, 2.0 on Z: the Y separation is the
        // greatest value, so Y is the resolved axis.
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::new(0.5, 1.8, 0.0));

        let hit = box_box_intersection(&a, &b).expect("boxes overlap");
        assert_relative_eq!(hit.translation, Vec3::new(0.0, -0.2, 0.0), epsilon = EPSILON);
        assert_eq!(hit.face, Face::Down);
    }

    #[test]
    fn test_box_box_resting_contact_reports_up() {
        // The other box sits below: negative Y delta maps to Face::Up and
        // an upward correction.
        let a = unit_box_at(Vec3::new(0.0, 1.5, 0.0));
        let b = unit_box_at(Vec3::zeros());

        let hit = box_box_intersection(&a, &b).expect("boxes overlap");
        assert_relative_eq!(hit.translation, Vec3::new(0.0, 0.5, 0.0), epsilon = EPSILON);
        assert_eq!(hit.face, Face::Up);
    }

    #[test]
    fn test_box_box_coincident_centers_tie() {
        // Every axis ties: intersecting, but no single axis qualifies.
        let a = unit_box_at(Vec3::zeros());
        let b = unit_box_at(Vec3::zeros());

        let hit = box_box_intersection(&a, &b).expect("boxes overlap");
        assert_relative_eq!(hit.translation, Vec3::zeros(), epsilon = EPSILON);
        assert_eq!(hit.face, Face::None);
    }

    #[test]
    fn test_raycast_plane_basic() {
        let distance = raycast_plane(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
        )
        .expect("plane hit");
        assert_relative_eq!(distance, 5.0, epsilon = EPSILON);
    }

    #[test]
    fn test_raycast_plane_rejects_parallel_and_behind() {
        // Parallel to the plane.
        assert!(raycast_plane(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
        )
        .is_none());

        // Pointing away from the plane.
        assert!(raycast_plane(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::zeros(),
            Vec3::new(0.0, 1.0, 0.0),
        )
        .is_none());
    }

    /// A wide wedge rising from y=0 at z=0 to y=5 at z=100. Its projection
    /// covers the +Z half-space around the origin but nothing at z < 0.
    fn wedge_triangle() -> Triangle {
        let mut triangle = Triangle::new(
            Vec3::new(-500.0, 0.0, 0.0),
            Vec3::new(0.0, 5.0, 100.0),
            Vec3::new(500.0, 0.0, 0.0),
        );
        triangle.transform(&Trs::identity());
        triangle
    }

    #[test]
    fn test_box_triangle_literal_stops_at_first_vertex() {
        // The box's first corner (its transformed local minimum, at
        // z = -0.5) projects outside the wedge, so the literal mode gives
        // up immediately. The full scan reaches the corners at z = +0.5
        // and reports the hit.
        let box_shape = unit_box_at(Vec3::zeros());
        let triangle = wedge_triangle();

        assert!(
            box_triangle_intersection(&box_shape, &triangle, TriangleResolution::Literal)
                .is_none()
        );

        let correction =
            box_triangle_intersection(&box_shape, &triangle, TriangleResolution::ScanAllVertices)
                .expect("full scan finds the contact");
        // Corner (-1, -1, 1) sits below the surface height 0.05 at z = 1;
        // the correction snaps its Y onto the plane.
        assert_relative_eq!(correction, Vec3::new(0.0, -1.05, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_box_terrain_accumulates_largest_correction() {
        let box_shape = unit_box_at(Vec3::zeros());
        // Two copies of the wedge at different heights give different
        // correction magnitudes; the larger one must win.
        let low = wedge_triangle();
        let mut high = Triangle::new(
            Vec3::new(-500.0, 2.0, 0.0),
            Vec3::new(0.0, 7.0, 100.0),
            Vec3::new(500.0, 2.0, 0.0),
        );
        high.transform(&Trs::identity());

        let terrain = Terrain::new(vec![low.clone(), high.clone()]);

        let low_only = box_triangle_intersection(&box_shape, &low, TriangleResolution::ScanAllVertices)
            .expect("low wedge hit");
        let high_only =
            box_triangle_intersection(&box_shape, &high, TriangleResolution::ScanAllVertices)
                .expect("high wedge hit");
        assert!(high_only.magnitude() > low_only.magnitude());

        let accumulated =
            box_terrain_intersection(&box_shape, &terrain, TriangleResolution::ScanAllVertices)
                .expect("terrain hit");
        assert_relative_eq!(accumulated, high_only, epsilon = 1e-4);
    }

    #[test]
    fn test_world_registry_order_and_lookup() {
        let mut world = PhysicsWorld::new();
        assert_eq!(world.shape_count(), 0);

        let a = world.add(Shape::Box(unit_box_at(Vec3::zeros())));
        let b = world.add(Shape::Box(unit_box_at(Vec3::new(5.0, 0.0, 0.0))));

        assert_eq!(world.shape_count(), 2);
        assert!(world.contains(a));
        assert_eq!(world.key_at(0), Some(a));
        assert_eq!(world.key_at(1), Some(b));
        assert!(world.shape_at(0).is_some());

        world.remove(a);
        assert_eq!(world.shape_count(), 1);
        assert!(!world.contains(a));
        assert_eq!(world.key_at(0), Some(b));
    }

    #[test]
    fn test_world_gravity_default_and_config() {
        let world = PhysicsWorld::new();
        assert_eq!(world.gravity(), -60.0);

        let config = SimulationConfig::new().with_gravity(-9.81);
        let mut world = PhysicsWorld::from_config(&config);
        assert_eq!(world.gravity(), -9.81);

        world.set_gravity(-10.0);
        assert_eq!(world.gravity(), -10.0);
    }

    #[test]
    fn test_world_raycast_returns_nearest() {
        let mut world = PhysicsWorld::new();
        let near = world.add(Shape::Box(unit_box_at(Vec3::new(0.0, 0.0, 5.0))));
        let _far = world.add(Shape::Box(unit_box_at(Vec3::new(0.0, 0.0, 10.0))));

        let hit = world
            .raycast(&Ray::new(Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0)))
            .expect("ray should hit");
        assert_eq!(hit.shape, near);
        assert_relative_eq!(hit.point, Vec3::new(0.0, 0.0, 4.0), epsilon = EPSILON);
    }

    #[test]
    fn test_world_raycast_mixed_shape_kinds() {
        let mut world = PhysicsWorld::new();
        let _box_key = world.add(Shape::Box(unit_box_at(Vec3::new(0.0, -20.0, 0.0))));

        let mut triangle = Triangle::new(
            Vec3::new(-10.0, -5.0, -10.0),
            Vec3::new(0.0, -5.0, 10.0),
            Vec3::new(10.0, -5.0, -10.0),
        );
        triangle.transform(&Trs::identity());
        let triangle_key = world.add(Shape::Triangle(triangle));

        let hit = world
            .raycast(&Ray::new(Vec3::zeros(), Vec3::new(0.0, -1.0, 0.0)))
            .expect("ray should hit");
        assert_eq!(hit.shape, triangle_key);
        assert_relative_eq!(hit.point, Vec3::new(0.0, -5.0, 0.0), epsilon = EPSILON);
    }
}
