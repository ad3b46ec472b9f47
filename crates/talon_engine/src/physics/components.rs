//! Per-entity physics components
//!
//! Components attach to an owning transform node, register shapes with the
//! [`PhysicsWorld`] on load, and drive the per-frame resolution pass.
//! Everything runs synchronously on the caller's thread: one update pass
//! resolves all components before the frame is rendered, and corrections
//! applied during a pass are visible to the tests that follow it within
//! the same frame.

use std::collections::HashMap;

use crate::foundation::math::Vec3;
use crate::scene::{TransformHierarchy, TransformKey};

use super::shapes::{BoxShape, Shape, Terrain};
use super::world::{
    box_box_intersection, box_terrain_intersection, box_triangle_intersection, PhysicsWorld,
    ShapeKey,
};
use super::Face;

/// Source of a mesh-local bounding box
///
/// Implemented by renderable assets so a [`BoxComponent`] can size its
/// collision box from mesh bounds instead of the owner's raw scale.
pub trait BoundsProvider {
    /// Mesh-local (min, max) corners
    fn local_bounds(&self) -> (Vec3, Vec3);
}

/// Callback invoked during the update pass with the other shape's owning
/// transform (when it has one) and the resolved face
pub type CollisionHook = Box<dyn FnMut(Option<TransformKey>, Face)>;

/// Per-entity box physics behavior
///
/// Drives gravity integration, collision resolution, contact tracking and
/// grounded-state detection for one owning transform node. The component
/// owns its registered box shape; other shapes are only read.
///
/// State machine: `Airborne` ⇄ `Grounded`, decided each frame by whether any
/// contact resolved with an `Up`-facing correction. Contacts are tracked
/// per other-shape identity so enter/exit events fire once per episode.
pub struct BoxComponent {
    owner: TransformKey,
    shape: Option<ShapeKey>,
    falling_velocity: f32,
    grounded: bool,
    contacts: HashMap<ShapeKey, Face>,
    ignore_gravity: bool,
    ignore_mtd: bool,
    collision_enter: Option<CollisionHook>,
    collision_exit: Option<CollisionHook>,
    mtd_correction: Option<CollisionHook>,
}

impl BoxComponent {
    /// Create a component for an owning transform node
    ///
    /// Gravity starts disabled, matching static-by-default level geometry;
    /// dynamic bodies opt in with [`BoxComponent::set_ignore_gravity`].
    pub fn new(owner: TransformKey) -> Self {
        Self {
            owner,
            shape: None,
            falling_velocity: 0.0,
            grounded: false,
            contacts: HashMap::new(),
            ignore_gravity: true,
            ignore_mtd: false,
            collision_enter: None,
            collision_exit: None,
            mtd_correction: None,
        }
    }

    /// The owning transform node
    pub fn owner(&self) -> TransformKey {
        self.owner
    }

    /// Key of the registered box shape, once attached
    pub fn shape_key(&self) -> Option<ShapeKey> {
        self.shape
    }

    /// Enable or disable gravity integration
    pub fn set_ignore_gravity(&mut self, ignore: bool) {
        self.ignore_gravity = ignore;
    }

    /// Escape hatch: skip the entire update (no gravity, no resolution)
    pub fn set_ignore_mtd(&mut self, ignore: bool) {
        self.ignore_mtd = ignore;
    }

    /// Whether the last update resolved an `Up`-facing contact
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Whether any contact is current
    pub fn is_colliding(&self) -> bool {
        !self.contacts.is_empty()
    }

    /// Current contacts with the face each one resolved along
    pub fn contacts(&self) -> impl Iterator<Item = (ShapeKey, Face)> + '_ {
        self.contacts.iter().map(|(&key, &face)| (key, face))
    }

    /// Current vertical velocity
    pub fn falling_velocity(&self) -> f32 {
        self.falling_velocity
    }

    /// Set the vertical velocity, e.g. for a jump impulse
    ///
    /// Has no effect while gravity is disabled.
    pub fn toss_up(&mut self, force: f32) {
        if !self.ignore_gravity {
            self.falling_velocity = force;
        }
    }

    /// Hook invoked the first frame a given shape becomes a contact
    pub fn on_collision_enter(&mut self, hook: CollisionHook) {
        self.collision_enter = Some(hook);
    }

    /// Hook invoked when a contact from the previous frame is gone
    pub fn on_collision_exit(&mut self, hook: CollisionHook) {
        self.collision_exit = Some(hook);
    }

    /// Hook invoked for every resolved correction
    pub fn on_mtd_correction(&mut self, hook: CollisionHook) {
        self.mtd_correction = Some(hook);
    }

    /// Build a collision box sized by the owner's world scale and register it
    ///
    /// Unit local bounds (±0.5); the transform's scale stretches them, so
    /// the world-space box spans ±scale/2 around the owner's position.
    pub fn attach(&mut self, physics: &mut PhysicsWorld, hierarchy: &TransformHierarchy) {
        self.attach_with_bounds(
            physics,
            hierarchy,
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, 0.5, 0.5),
        );
    }

    /// Build the collision box from a renderable's mesh bounds and register it
    pub fn attach_from_provider(
        &mut self,
        physics: &mut PhysicsWorld,
        hierarchy: &TransformHierarchy,
        provider: &dyn BoundsProvider,
    ) {
        let (min, max) = provider.local_bounds();
        self.attach_with_bounds(physics, hierarchy, min, max);
    }

    /// Build the collision box from explicit local bounds and register it
    pub fn attach_with_bounds(
        &mut self,
        physics: &mut PhysicsWorld,
        hierarchy: &TransformHierarchy,
        min: Vec3,
        max: Vec3,
    ) {
        self.detach(physics);

        let mut box_shape = BoxShape::new(min, max);
        box_shape.set_owner(Some(self.owner));
        box_shape.transform(&hierarchy.world_trs(self.owner));
        self.shape = Some(physics.add(Shape::Box(box_shape)));
    }

    /// Replace the box's local bounds in place
    pub fn set_bounds(
        &mut self,
        physics: &mut PhysicsWorld,
        hierarchy: &TransformHierarchy,
        min: Vec3,
        max: Vec3,
    ) {
        if let Some(key) = self.shape {
            if let Some(Shape::Box(box_shape)) = physics.shape_mut(key) {
                box_shape.set_bounds(min, max);
                box_shape.transform(&hierarchy.world_trs(self.owner));
            }
        } else {
            self.attach_with_bounds(physics, hierarchy, min, max);
        }
    }

    /// Unregister the box shape, dropping all contact state
    pub fn detach(&mut self, physics: &mut PhysicsWorld) {
        if let Some(key) = self.shape.take() {
            physics.remove(key);
        }
        self.contacts.clear();
        self.grounded = false;
    }

    /// Run one physics step for this component
    ///
    /// Re-transforms the own shape, integrates gravity, scans every
    /// registered shape in insertion order, and applies each resolved
    /// correction to the owner's world position immediately, so later
    /// tests in the same pass see the corrected position. A missing box
    /// shape or `ignore_mtd` short-circuits the whole update.
    pub fn update(
        &mut self,
        physics: &mut PhysicsWorld,
        hierarchy: &mut TransformHierarchy,
        delta_time: f32,
    ) {
        let Some(self_key) = self.shape else {
            return;
        };
        if self.ignore_mtd || !physics.contains(self_key) {
            return;
        }

        self.retransform(physics, hierarchy, self_key);

        if !self.ignore_gravity {
            self.falling_velocity += physics.gravity() * delta_time;
            let displaced = hierarchy.world_position(self.owner)
                + Vec3::new(0.0, self.falling_velocity * delta_time, 0.0);
            hierarchy.set_world_position(self.owner, displaced);
            self.retransform(physics, hierarchy, self_key);
        }

        self.grounded = false;
        let mut current: HashMap<ShapeKey, Face> = HashMap::new();
        let mode = physics.triangle_resolution();

        let keys: Vec<ShapeKey> = physics.keys().collect();
        for other_key in keys {
            if other_key == self_key {
                continue;
            }

            let Some(other) = physics.shape(other_key) else {
                continue;
            };
            if let Some(other_owner) = other.owner() {
                if !hierarchy.is_active(other_owner) {
                    continue;
                }
            }

            let hit = {
                let Some(my_box) = physics.shape(self_key).and_then(Shape::as_box) else {
                    return;
                };
                match physics.shape(other_key) {
                    Some(Shape::Box(other_box)) => box_box_intersection(my_box, other_box)
                        .map(|hit| (hit.translation, hit.face)),
                    Some(Shape::Triangle(triangle)) => {
                        box_triangle_intersection(my_box, triangle, mode)
                            .map(|translation| (translation, Face::Up))
                    }
                    Some(Shape::Terrain(terrain)) => {
                        box_terrain_intersection(my_box, terrain, mode)
                            .map(|translation| (translation, Face::Up))
                    }
                    None => None,
                }
            };

            let Some((translation, face)) = hit else {
                continue;
            };

            let corrected = hierarchy.world_position(self.owner) + translation;
            hierarchy.set_world_position(self.owner, corrected);
            self.retransform(physics, hierarchy, self_key);

            if face == Face::Up {
                self.falling_velocity = 0.0;
                self.grounded = true;
            }

            let other_owner = physics.shape(other_key).and_then(Shape::owner);
            let newly_entered = !self.contacts.contains_key(&other_key);
            current.insert(other_key, face);

            if newly_entered {
                log::trace!("contact enter {other_key:?} ({face:?})");
                if let Some(hook) = &mut self.collision_enter {
                    hook(other_owner, face);
                }
            }
            if let Some(hook) = &mut self.mtd_correction {
                hook(other_owner, face);
            }
        }

        let previous = std::mem::replace(&mut self.contacts, current);
        for (other_key, face) in previous {
            if self.contacts.contains_key(&other_key) {
                continue;
            }
            log::trace!("contact exit {other_key:?} ({face:?})");
            let other_owner = physics.shape(other_key).and_then(Shape::owner);
            if let Some(hook) = &mut self.collision_exit {
                hook(other_owner, face);
            }
        }
    }

    fn retransform(
        &self,
        physics: &mut PhysicsWorld,
        hierarchy: &TransformHierarchy,
        key: ShapeKey,
    ) {
        let pose = hierarchy.world_trs(self.owner);
        if let Some(shape) = physics.shape_mut(key) {
            shape.transform(&pose);
        }
    }
}

/// Registers a static terrain shape for an owning transform node
pub struct TerrainComponent {
    owner: TransformKey,
    shape: Option<ShapeKey>,
}

impl TerrainComponent {
    /// Create a component for an owning transform node
    pub fn new(owner: TransformKey) -> Self {
        Self { owner, shape: None }
    }

    /// The owning transform node
    pub fn owner(&self) -> TransformKey {
        self.owner
    }

    /// Key of the registered terrain shape, once set
    pub fn shape_key(&self) -> Option<ShapeKey> {
        self.shape
    }

    /// Register a terrain shape, replacing any previous registration
    pub fn set_terrain(
        &mut self,
        physics: &mut PhysicsWorld,
        hierarchy: &TransformHierarchy,
        terrain: Terrain,
    ) {
        self.detach(physics);

        let mut terrain = terrain;
        terrain.set_owner(Some(self.owner));
        terrain.transform(&hierarchy.world_trs(self.owner));
        self.shape = Some(physics.add(Shape::Terrain(terrain)));
    }

    /// Unregister the terrain shape
    pub fn detach(&mut self, physics: &mut PhysicsWorld) {
        if let Some(key) = self.shape.take() {
            if physics.contains(key) {
                physics.remove(key);
            }
        }
    }
}
