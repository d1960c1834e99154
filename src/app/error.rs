use std::path::PathBuf;

use super::data::UniformType;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load model {path:?}: {source}")]
    ObjLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model {0:?} contains no meshes")]
    EmptyModel(PathBuf),

    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("shader program failed to link:\n{0}")]
    ShaderLink(String),

    #[error("GL error: {0}")]
    Gl(String),

    #[error("unknown uniform `{0}`")]
    UnknownUniform(String),

    #[error("no tunable at index {0}")]
    UnknownTunable(usize),

    #[error("uniform `{name}` is {expected:?}, got {actual:?}")]
    UniformTypeMismatch {
        name: String,
        expected: UniformType,
        actual: UniformType,
    },

    #[error("shader pair does not declare uniform `{name}` as {expected:?}")]
    ShaderContract { name: String, expected: UniformType },

    #[error("model loader thread exited without a result")]
    LoaderDisconnected,
}

pub type Result<T, E = SceneError> = std::result::Result<T, E>;
