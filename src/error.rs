//! Error type shared by the whole crate.
//!
//! Hot-path preconditions (adding an incompatible quad to a batch, overflowing the
//! 16-bit index range) are debug assertions, not errors. Everything here is a
//! condition a caller can reasonably check for and react to.

use thiserror::Error;

use crate::display::NodeId;
use crate::effect::UniformType;
use crate::texture::TextureId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The operation is not defined for the given input (e.g. inverting a
    /// degenerate matrix, creating a cycle in the display tree).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Nodes do not share a common root")]
    NotRelated,
    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("Node {0:?} no longer exists")]
    StaleNode(NodeId),
    #[error("Node {0:?} is not a container")]
    NotAContainer(NodeId),
    #[error("Program '{program}' has no position attribute")]
    MissingPositionAttribute { program: String },
    #[error("Uniform '{name}' expects {expected:?}, got {found:?}")]
    UniformTypeMismatch {
        name: String,
        expected: UniformType,
        found: UniformType,
    },
    #[error("Texture {0:?} has not been uploaded")]
    UnknownTexture(TextureId),
    #[error("GPU error: {0}")]
    Gpu(String),
}

pub type Result<T> = std::result::Result<T, Error>;
