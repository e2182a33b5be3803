use crate::resolution::{InvocationContext, ParameterDescriptor};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResolutionError {
    #[error("no resolver supports parameter {index} '{name}' ({shape}) of {test_id}")]
    Unresolvable {
        test_id: String,
        index: usize,
        name: String,
        shape: String,
    },

    #[error(
        "parameter {index} '{name}' ({shape}) of {test_id} is claimed by multiple resolvers: {}",
        .resolvers.join(", ")
    )]
    Ambiguous {
        test_id: String,
        index: usize,
        name: String,
        shape: String,
        resolvers: Vec<String>,
    },

    #[error("resolver '{resolver}' failed for parameter '{name}': {message}")]
    ResolverFailed {
        resolver: String,
        name: String,
        message: String,
    },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("argument {index} is missing or was already taken")]
    MissingArgument { index: usize },
}

impl ResolutionError {
    pub fn unresolvable(param: &ParameterDescriptor, ctx: &InvocationContext) -> Self {
        Self::Unresolvable {
            test_id: ctx.test_id().to_string(),
            index: param.index(),
            name: param.name().to_string(),
            shape: param.shape().to_string(),
        }
    }

    pub fn ambiguous(
        param: &ParameterDescriptor,
        ctx: &InvocationContext,
        resolvers: Vec<String>,
    ) -> Self {
        Self::Ambiguous {
            test_id: ctx.test_id().to_string(),
            index: param.index(),
            name: param.name().to_string(),
            shape: param.shape().to_string(),
            resolvers,
        }
    }

    pub fn resolver_failed(
        resolver: impl Into<String>,
        param: &ParameterDescriptor,
        message: impl Into<String>,
    ) -> Self {
        Self::ResolverFailed {
            resolver: resolver.into(),
            name: param.name().to_string(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn missing_argument(index: usize) -> Self {
        Self::MissingArgument { index }
    }
}
