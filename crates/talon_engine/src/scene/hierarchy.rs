//! Transform hierarchy
//!
//! A tree of position/rotation/scale nodes with dual local/world caches.
//! Setting a world-space property solves the local values through the
//! inverse parent matrix; setting a local-space property recomputes the
//! world values forward. Either way the change cascades to every child, so
//! cached world data is never stale.
//!
//! Every mutation is O(subtree) due to the cascading recompute; keep that
//! in mind for deep hierarchies mutated every frame.

use slotmap::SlotMap;

use crate::foundation::math::{look_rotation, Mat4, Quat, Trs, Vec3};

slotmap::new_key_type! {
    /// Stable handle to a node in a [`TransformHierarchy`]
    pub struct TransformKey;
}

/// Coordinate space selector for relative operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// The node's own parent-relative frame
    Local,
    /// The global frame
    World,
}

/// What a reparent operation preserves
///
/// Reparenting cannot preserve both local and world values; the caller
/// picks one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReparentMode {
    /// Keep local values; world values are recomputed under the new parent
    KeepLocal,
    /// Keep world values; local values are re-solved under the new parent
    KeepWorld,
}

/// Which aspect of a node changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformEventKind {
    /// Position was written
    Moved,
    /// Rotation was written
    Rotated,
    /// Scale was written
    Scaled,
}

/// Notification that a node was mutated through a setter
///
/// Events accumulate on the hierarchy and are collected with
/// [`TransformHierarchy::drain_events`]; only the directly mutated node is
/// reported, not the children it cascaded to.
#[derive(Debug, Clone, Copy)]
pub struct TransformEvent {
    /// The mutated node
    pub key: TransformKey,
    /// What kind of mutation occurred
    pub kind: TransformEventKind,
}

/// Errors from hierarchy structure mutations
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum HierarchyError {
    /// Reparenting would make a node its own ancestor
    #[error("reparenting would create a cycle in the hierarchy")]
    CycleDetected,
    /// A key did not resolve to a live node
    #[error("transform key is not present in the hierarchy")]
    MissingNode,
}

#[derive(Debug)]
struct TransformNode {
    local: Trs,
    world: Trs,
    world_matrix: Mat4,
    parent: Option<TransformKey>,
    children: Vec<TransformKey>,
    active: bool,
}

impl TransformNode {
    fn identity() -> Self {
        Self {
            local: Trs::identity(),
            world: Trs::identity(),
            world_matrix: Mat4::identity(),
            parent: None,
            children: Vec::new(),
            active: true,
        }
    }
}

/// Arena of transform nodes forming a forest of trees
#[derive(Debug, Default)]
pub struct TransformHierarchy {
    nodes: SlotMap<TransformKey, TransformNode>,
    events: Vec<TransformEvent>,
}

// Degenerate look-at targets are nudged by this much so the direction
// never has zero length.
const LOOK_EPSILON: f32 = 1e-5;

impl TransformHierarchy {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root node with an identity transform
    pub fn create(&mut self) -> TransformKey {
        self.nodes.insert(TransformNode::identity())
    }

    /// Create an identity node parented under `parent`
    pub fn create_child(&mut self, parent: TransformKey) -> TransformKey {
        let key = self.create();
        self.nodes[key].parent = Some(parent);
        self.nodes[parent].children.push(key);
        self.recompute(key);
        key
    }

    /// Remove a node and its entire subtree
    pub fn remove(&mut self, key: TransformKey) {
        if let Some(parent) = self.nodes.get(key).and_then(|n| n.parent) {
            self.nodes[parent].children.retain(|&c| c != key);
        }
        self.remove_subtree(key);
    }

    fn remove_subtree(&mut self, key: TransformKey) {
        if let Some(node) = self.nodes.remove(key) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the hierarchy has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `key` resolves to a live node
    pub fn contains(&self, key: TransformKey) -> bool {
        self.nodes.contains_key(key)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// The node's parent, if any
    pub fn parent(&self, key: TransformKey) -> Option<TransformKey> {
        self.nodes[key].parent
    }

    /// The node's children, in attach order
    pub fn children(&self, key: TransformKey) -> &[TransformKey] {
        &self.nodes[key].children
    }

    /// Number of direct children
    pub fn child_count(&self, key: TransformKey) -> usize {
        self.nodes[key].children.len()
    }

    /// Reparent a node, preserving either its local or its world values
    ///
    /// `new_parent = None` detaches the node to the root level. Fails if
    /// the new parent is the node itself or one of its descendants.
    pub fn set_parent(
        &mut self,
        key: TransformKey,
        new_parent: Option<TransformKey>,
        mode: ReparentMode,
    ) -> Result<(), HierarchyError> {
        if !self.nodes.contains_key(key)
            || new_parent.is_some_and(|p| !self.nodes.contains_key(p))
        {
            return Err(HierarchyError::MissingNode);
        }
        if let Some(parent) = new_parent {
            if self.would_cycle(key, parent) {
                return Err(HierarchyError::CycleDetected);
            }
        }

        if let Some(old_parent) = self.nodes[key].parent {
            self.nodes[old_parent].children.retain(|&c| c != key);
        }
        self.nodes[key].parent = new_parent;
        if let Some(parent) = new_parent {
            self.nodes[parent].children.push(key);
        }

        match mode {
            ReparentMode::KeepLocal => self.recompute(key),
            ReparentMode::KeepWorld => self.solve_local(key),
        }
        Ok(())
    }

    fn would_cycle(&self, key: TransformKey, candidate: TransformKey) -> bool {
        let mut current = Some(candidate);
        while let Some(ancestor) = current {
            if ancestor == key {
                return true;
            }
            current = self.nodes[ancestor].parent;
        }
        false
    }

    /// Mark a node active or inactive
    ///
    /// Inactive nodes still transform normally; physics skips shapes whose
    /// owner is inactive.
    pub fn set_active(&mut self, key: TransformKey, active: bool) {
        self.nodes[key].active = active;
    }

    /// Whether the node is active (missing nodes count as inactive)
    pub fn is_active(&self, key: TransformKey) -> bool {
        self.nodes.get(key).map_or(false, |n| n.active)
    }

    // ------------------------------------------------------------------
    // World space accessors and setters
    // ------------------------------------------------------------------

    /// World-space position
    pub fn world_position(&self, key: TransformKey) -> Vec3 {
        self.nodes[key].world.position
    }

    /// World-space rotation
    pub fn world_rotation(&self, key: TransformKey) -> Quat {
        self.nodes[key].world.rotation
    }

    /// World-space scale
    pub fn world_scale(&self, key: TransformKey) -> Vec3 {
        self.nodes[key].world.scale
    }

    /// World-space position/rotation/scale triple
    pub fn world_trs(&self, key: TransformKey) -> Trs {
        self.nodes[key].world.clone()
    }

    /// Cached world matrix (parent world matrix × local TRS)
    pub fn world_matrix(&self, key: TransformKey) -> Mat4 {
        self.nodes[key].world_matrix
    }

    /// Set the world-space position, re-solving local values
    pub fn set_world_position(&mut self, key: TransformKey, position: Vec3) {
        self.nodes[key].world.position = position;
        self.solve_local(key);
        self.push_event(key, TransformEventKind::Moved);
    }

    /// Set the world-space rotation, re-solving local values
    pub fn set_world_rotation(&mut self, key: TransformKey, rotation: Quat) {
        self.nodes[key].world.rotation = rotation;
        self.solve_local(key);
        self.push_event(key, TransformEventKind::Rotated);
    }

    /// Set the world-space scale, re-solving local values
    pub fn set_world_scale(&mut self, key: TransformKey, scale: Vec3) {
        self.nodes[key].world.scale = scale;
        self.solve_local(key);
        self.push_event(key, TransformEventKind::Scaled);
    }

    /// World-space rotation as (roll, pitch, yaw) euler angles
    pub fn world_euler_angles(&self, key: TransformKey) -> Vec3 {
        let (roll, pitch, yaw) = self.nodes[key].world.rotation.euler_angles();
        Vec3::new(roll, pitch, yaw)
    }

    // ------------------------------------------------------------------
    // Local space accessors and setters
    // ------------------------------------------------------------------

    /// Parent-relative position
    pub fn local_position(&self, key: TransformKey) -> Vec3 {
        self.nodes[key].local.position
    }

    /// Parent-relative rotation
    pub fn local_rotation(&self, key: TransformKey) -> Quat {
        self.nodes[key].local.rotation
    }

    /// Parent-relative scale
    pub fn local_scale(&self, key: TransformKey) -> Vec3 {
        self.nodes[key].local.scale
    }

    /// Set the parent-relative position, recomputing world values
    pub fn set_local_position(&mut self, key: TransformKey, position: Vec3) {
        self.nodes[key].local.position = position;
        self.recompute(key);
        self.push_event(key, TransformEventKind::Moved);
    }

    /// Set the parent-relative rotation, recomputing world values
    pub fn set_local_rotation(&mut self, key: TransformKey, rotation: Quat) {
        self.nodes[key].local.rotation = rotation;
        self.recompute(key);
        self.push_event(key, TransformEventKind::Rotated);
    }

    /// Set the parent-relative scale, recomputing world values
    pub fn set_local_scale(&mut self, key: TransformKey, scale: Vec3) {
        self.nodes[key].local.scale = scale;
        self.recompute(key);
        self.push_event(key, TransformEventKind::Scaled);
    }

    /// Set the parent-relative rotation from (roll, pitch, yaw) euler angles
    pub fn set_local_euler_angles(&mut self, key: TransformKey, angles: Vec3) {
        self.set_local_rotation(key, Quat::from_euler_angles(angles.x, angles.y, angles.z));
    }

    // ------------------------------------------------------------------
    // Relative operations
    // ------------------------------------------------------------------

    /// Displace the node's local position by `delta`
    pub fn translate(&mut self, key: TransformKey, delta: Vec3) {
        let position = self.nodes[key].local.position + delta;
        self.set_local_position(key, position);
    }

    /// Pre-multiply a rotation in the chosen space
    ///
    /// The composed quaternion is re-normalized to prevent drift under
    /// repeated incremental rotation.
    pub fn rotate(&mut self, key: TransformKey, rotation: Quat, space: Space) {
        match space {
            Space::Local => {
                let composed = rotation * self.nodes[key].local.rotation;
                self.set_local_rotation(key, Quat::new_normalize(composed.into_inner()));
            }
            Space::World => {
                let composed = rotation * self.nodes[key].world.rotation;
                self.set_world_rotation(key, Quat::new_normalize(composed.into_inner()));
            }
        }
    }

    /// Rotate the node so its forward axis points at `target`
    ///
    /// A target coincident with the node's own position would yield a
    /// zero-length direction; it is nudged by a negligible offset instead.
    pub fn look_at(&mut self, key: TransformKey, target: Vec3, up: Vec3) {
        let position = self.nodes[key].world.position;
        let mut target = target;
        if (target - position).magnitude_squared() < LOOK_EPSILON * LOOK_EPSILON {
            target += Vec3::new(LOOK_EPSILON, LOOK_EPSILON, LOOK_EPSILON);
        }
        let direction = (target - position).normalize();
        self.set_world_rotation(key, look_rotation(direction, up));
    }

    /// The node's forward axis (-Z) in world space
    pub fn forward(&self, key: TransformKey) -> Vec3 {
        self.nodes[key].world.rotation * Vec3::new(0.0, 0.0, -1.0)
    }

    /// The node's up axis (+Y) in world space
    pub fn up(&self, key: TransformKey) -> Vec3 {
        self.nodes[key].world.rotation * Vec3::y()
    }

    /// The node's right axis (+X) in world space
    pub fn right(&self, key: TransformKey) -> Vec3 {
        self.nodes[key].world.rotation * Vec3::x()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Take all mutation events accumulated since the last drain
    pub fn drain_events(&mut self) -> Vec<TransformEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_event(&mut self, key: TransformKey, kind: TransformEventKind) {
        self.events.push(TransformEvent { key, kind });
    }

    // ------------------------------------------------------------------
    // Recompute machinery
    // ------------------------------------------------------------------

    fn parent_matrix(&self, key: TransformKey) -> Mat4 {
        self.nodes[key]
            .parent
            .map_or_else(Mat4::identity, |p| self.nodes[p].world_matrix)
    }

    /// Re-solve local values so the forward recompute reproduces the
    /// node's current world values, then cascade.
    fn solve_local(&mut self, key: TransformKey) {
        let parent_matrix = self.parent_matrix(key);
        let inverse_parent = parent_matrix.try_inverse().unwrap_or_else(Mat4::identity);
        let node = &mut self.nodes[key];
        node.local = Trs::from_matrix(inverse_parent * node.world.to_matrix());
        self.recompute(key);
    }

    /// Forward recompute: world = parent world × local TRS, cascading to
    /// all children so none keeps stale cached values.
    fn recompute(&mut self, key: TransformKey) {
        let parent_matrix = self.parent_matrix(key);
        let node = &mut self.nodes[key];
        node.world_matrix = parent_matrix * node.local.to_matrix();
        node.world = Trs::from_matrix(node.world_matrix);

        let children = node.children.clone();
        for child in children {
            self.recompute(child);
        }
    }
}
