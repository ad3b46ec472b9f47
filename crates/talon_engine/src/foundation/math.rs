//! Math utilities and types
//!
//! Provides fundamental math types for 3D simulation, built on nalgebra.
//! All coordinates follow Y-up right-handed conventions.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// A position/rotation/scale triple
///
/// Value type for transform math; the scene graph stores one for local
/// space and one for world space per node.
#[derive(Debug, Clone, PartialEq)]
pub struct Trs {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Trs {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Trs {
    /// Create a new identity triple
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a triple with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create from full position, rotation, and scale
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Create a triple from a transformation matrix (decompose TRS)
    pub fn from_matrix(matrix: Mat4) -> Self {
        // Extract position
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        // Extract scale from the matrix columns
        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        // Extract rotation by removing scale from the rotation matrix
        let rotation_matrix = Matrix3::new(
            matrix.m11 / scale_x, matrix.m12 / scale_y, matrix.m13 / scale_z,
            matrix.m21 / scale_x, matrix.m22 / scale_y, matrix.m23 / scale_z,
            matrix.m31 / scale_x, matrix.m32 / scale_y, matrix.m33 / scale_z,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Apply this triple to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * self.scale.component_mul(&point) + self.position
    }
}

/// Compute a rotation whose forward axis (-Z) points along `direction`
///
/// `direction` must be normalized; `up` is a hint and need not be exactly
/// orthogonal to `direction`.
pub fn look_rotation(direction: Vec3, up: Vec3) -> Quat {
    let forward = direction;
    let right = forward.cross(&up.normalize()).normalize();
    let camera_up = right.cross(&forward);

    // Build rotation basis and convert to quaternion
    let rotation_matrix = Mat3::new(
        right.x, camera_up.x, -forward.x,
        right.y, camera_up.y, -forward.y,
        right.z, camera_up.z, -forward.z,
    );

    Quat::from_matrix(&rotation_matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_trs_identity() {
        let trs = Trs::identity();

        assert_eq!(trs.position, Vec3::zeros());
        assert_relative_eq!(trs.rotation, Quat::identity(), epsilon = EPSILON);
        assert_eq!(trs.scale, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_matrix_roundtrip_consistency() {
        // Test Trs ↔ Matrix conversion consistency
        let original = Trs::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(&Unit::new_normalize(Vec3::new(1.0, 1.0, 1.0)), 0.5),
            Vec3::new(2.0, 1.5, 0.8),
        );

        let matrix = original.to_matrix();
        let reconstructed = Trs::from_matrix(matrix);

        assert_relative_eq!(reconstructed.position, original.position, epsilon = EPSILON);
        assert_relative_eq!(reconstructed.scale, original.scale, epsilon = EPSILON);

        // Quaternions might flip sign but represent same rotation
        let dot = original.rotation.coords.dot(&reconstructed.rotation.coords);
        assert!(dot.abs() > 0.999, "Quaternion rotation mismatch: dot product = {}", dot);
    }

    #[test]
    fn test_transform_point_matches_matrix() {
        let trs = Trs::new(
            Vec3::new(-2.0, 4.0, 1.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 0.7),
            Vec3::new(1.0, 2.0, 3.0),
        );
        let point = Vec3::new(0.5, -1.0, 2.0);

        let by_trs = trs.transform_point(point);
        let by_matrix = trs.to_matrix().transform_point(&Point3::from(point));

        assert_relative_eq!(by_trs, by_matrix.coords, epsilon = EPSILON);
    }

    #[test]
    fn test_look_rotation_points_forward() {
        let direction = Vec3::new(-0.7, -1.0, 0.3).normalize();
        let rotation = look_rotation(direction, Vec3::y());

        let forward = rotation * Vec3::new(0.0, 0.0, -1.0);
        assert_relative_eq!(forward, direction, epsilon = 1e-4);
    }
}
