use thiserror::Error;

use crate::shape::{Identity, TypeShape};

/// Why a run could not produce a well-formed schema. Every variant aborts the
/// whole run; there is no partial output.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("illegal key type `{key}` for map property `{message}.{property}` (double, float, bytes and non-scalar keys are not allowed)")]
    IllegalMapKeyType {
        message: String,
        property: String,
        key: TypeShape,
    },

    #[error("message `{message}` mixes sequential and declared field numbers (property `{property}`)")]
    ConflictingTagStrategy {
        message: String,
        property: String,
    },

    #[error("no wire representation for property `{message}.{property}` of shape `{shape}`")]
    UnsupportedPropertyShape {
        message: String,
        property: String,
        shape: TypeShape,
    },

    #[error("internal error: type `{0}` was built twice")]
    DuplicateBuildInvariantViolation(Identity),

    #[error("introspector cannot describe type `{0}`")]
    UnresolvedType(Identity),

    #[error("invalid declared field number {tag} on `{message}.{property}` (must be positive)")]
    InvalidTag {
        message: String,
        property: String,
        tag: u32,
    },

    #[error("field number {tag} used twice in message `{message}` (second use on `{property}`)")]
    DuplicateTag {
        message: String,
        property: String,
        tag: u32,
    },

    #[error("definition name `{name}` is claimed by both `{first}` and `{second}`")]
    DuplicateTypeName {
        name: String,
        first: String,
        second: String,
    },

    #[error("root type `{0}` does not describe a message")]
    RootNotAMessage(Identity),
}

pub type Result<T> = std::result::Result<T, InferenceError>;
