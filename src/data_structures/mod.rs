//! Engine data structures: models, textures, scene graphs, and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains meshes, models, the vertex layout and the draw traits
//! - `texture` contains GPU texture wrapper and texture references
//! - `instance` holds per-instance transformation data
//! - `scene_graph` holds the imported node tree, sub-meshes and materials
//! - `geometry` builds the procedural cube and the demo layout

pub mod geometry;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
