//! # Talon Engine
//!
//! A small real-time 3D engine core: a hierarchical scene graph with
//! transform propagation and a physics subsystem doing AABB/triangle/terrain
//! collision with minimum-translation-distance resolution.
//!
//! ## Features
//!
//! - **Scene graph**: arena-backed transform hierarchy with dual local/world
//!   caches that stay consistent under reparenting and inverse solves
//! - **Physics**: insertion-ordered shape registry, box/triangle/terrain
//!   intersection tests, ray casting, gravity integration
//! - **Components**: per-entity physics behavior with grounded-state
//!   detection and contact enter/exit events
//!
//! ## Quick Start
//!
//! ```rust
//! use talon_engine::prelude::*;
//!
//! let mut scene = TransformHierarchy::new();
//! let mut physics = PhysicsWorld::new();
//!
//! // A dynamic crate falling onto a static floor.
//! let floor = scene.create();
//! scene.set_world_scale(floor, Vec3::new(20.0, 1.0, 20.0));
//! let mut floor_body = BoxComponent::new(floor);
//! floor_body.attach(&mut physics, &mut scene);
//!
//! let crate_node = scene.create();
//! scene.set_world_position(crate_node, Vec3::new(0.0, 10.0, 0.0));
//! let mut crate_body = BoxComponent::new(crate_node);
//! crate_body.set_ignore_gravity(false);
//! crate_body.attach(&mut physics, &mut scene);
//!
//! for _ in 0..240 {
//!     crate_body.update(&mut physics, &mut scene, 1.0 / 60.0);
//! }
//! assert!(crate_body.is_grounded());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod physics;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, SimulationConfig},
        foundation::{
            math::{Mat4, Quat, Trs, Vec3},
            time::Timer,
        },
        physics::{
            BoxComponent, BoxShape, Face, PhysicsWorld, Ray, RayHit, Shape, ShapeKey, Terrain,
            TerrainComponent, Triangle, TriangleResolution,
        },
        scene::{ReparentMode, Space, TransformEvent, TransformHierarchy, TransformKey},
    };
}
