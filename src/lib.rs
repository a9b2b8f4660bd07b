//! lumen-ngin
//!
//! A small real-time 3D rendering demo built on wgpu. Its core is the model
//! pipeline: import a scene graph from an OBJ or glTF file, flatten it into
//! drawable meshes, upload each texture once per model and bind the textures
//! by the sampler names the shaders expect.
//!
//! High-level modules
//! - `camera`: first-person camera, controller and view/projection uniform
//! - `config`: window and asset settings of the demo
//! - `context`: the graphics capability seam plus the window/GPU context
//! - `data_structures`: vertices, meshes, models, instances, textures and scene data
//! - `error`: the error type of loading and start-up
//! - `flow`: the winit event loop
//! - `pipelines`: render pipelines, shaders and light uniforms
//! - `render`: the demo scene and its per-frame draws
//! - `resources`: importers, post-processing and texture loading
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use error::{NginError, Result};
