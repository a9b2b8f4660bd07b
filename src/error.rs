//! Error types shared by the loading pipeline and the window/GPU setup.

use std::path::PathBuf;

/// Everything that can abort a model load or the application start-up.
///
/// None of these are recovered locally: a failed model load produces no
/// [`Model`](crate::data_structures::model::Model) at all and the GPU
/// resources created before the failure are released when the partial
/// state is dropped.
#[derive(Debug, thiserror::Error)]
pub enum NginError {
    #[error("failed to import model '{path}': {message}")]
    ModelImport { path: PathBuf, message: String },

    #[error("texture failed to load at path '{path}'")]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("mesh '{mesh}' references vertex {index} but only has {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },

    #[error("can't create a window: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    #[error("graphics initialization failed while {stage}: {source}")]
    GraphicsInit {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl NginError {
    pub(crate) fn import(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ModelImport {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn graphics_init(
        stage: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::GraphicsInit {
            stage,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, NginError>;
