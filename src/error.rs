//! Error types
//!
//! Every error in this crate is an unrecoverable engineering or resource
//! failure. Ordinary per-frame outcomes (a light with nothing to shadow)
//! are reported through return values instead.

use crate::renderer::light::LightId;
use crate::renderer::object::ObjectId;
use crate::renderer::shader::{ShaderVariant, UniformKind};

/// Errors raised by the shadow and shader dispatch core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A compiled shader program could not be loaded.
    #[error("failed to load shader variant {variant:?}")]
    ShaderLoad {
        variant: ShaderVariant,
        #[source]
        source: anyhow::Error,
    },

    /// A loaded program has no location for a uniform its variant requires.
    #[error("shader variant {variant:?} has no location for uniform {uniform:?}")]
    MissingUniform {
        variant: ShaderVariant,
        uniform: UniformKind,
    },

    /// A GPU shadow target could not be created.
    #[error("shadow target allocation failed: {0}")]
    TargetAllocation(String),

    /// An object id does not refer to a live scene object.
    #[error("unknown scene object {0:?}")]
    UnknownObject(ObjectId),

    /// A light id does not refer to a scene light.
    #[error("unknown light {0:?}")]
    UnknownLight(LightId),

    /// An internal consistency check failed.
    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
}

impl Error {
    /// Whether the error must stop the frame.
    ///
    /// All current variants are fatal; the embedding application is
    /// expected to abort rather than render a partial frame.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::ShaderLoad { .. }
            | Error::MissingUniform { .. }
            | Error::TargetAllocation(_)
            | Error::UnknownObject(_)
            | Error::UnknownLight(_)
            | Error::Invariant(_) => true,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
