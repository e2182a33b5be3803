pub mod context;
pub mod descriptor;
pub mod resolvers;
pub mod value;

pub use context::InvocationContext;
pub use descriptor::{ParameterDescriptor, Shape, TypeKey};
pub use resolvers::{FnResolver, SequenceResolver, SupplierResolver, TypedResolver};
pub use value::{ResolvedValue, Supplier};

use crate::error::ResolutionError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// A unit that can supply a value for an otherwise unbound parameter.
pub trait ParameterResolver: Send + Sync {
    fn name(&self) -> &str;
    fn supports(&self, param: &ParameterDescriptor, ctx: &InvocationContext) -> bool;
    fn resolve(
        &self,
        param: &ParameterDescriptor,
        ctx: &InvocationContext,
    ) -> Result<ResolvedValue, ResolutionError>;
}

/// What to do when more than one resolver claims the same parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Fail with `ResolutionError::Ambiguous`
    #[default]
    Strict,
    /// Use the earliest registered claimant
    FirstMatch,
}

pub struct Dispatcher {
    resolvers: Vec<Arc<dyn ParameterResolver>>,
    policy: MatchPolicy,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
            policy: MatchPolicy::default(),
        }
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Returns whether any registered resolver claims `param`.
    pub fn supports(&self, param: &ParameterDescriptor, ctx: &InvocationContext) -> bool {
        self.resolvers.iter().any(|r| r.supports(param, ctx))
    }

    /// Names of every resolver claiming `param`, in registration order.
    pub fn claimants(&self, param: &ParameterDescriptor, ctx: &InvocationContext) -> Vec<String> {
        self.resolvers
            .iter()
            .filter(|r| r.supports(param, ctx))
            .map(|r| r.name().to_string())
            .collect()
    }

    pub fn resolve(
        &self,
        param: &ParameterDescriptor,
        ctx: &InvocationContext,
    ) -> Result<ResolvedValue, ResolutionError> {
        let mut matching = self.resolvers.iter().filter(|r| r.supports(param, ctx));

        let Some(resolver) = matching.next() else {
            debug!(test = ctx.test_id(), param = param.name(), "no resolver claims parameter");
            return Err(ResolutionError::unresolvable(param, ctx));
        };

        if self.policy == MatchPolicy::Strict && matching.next().is_some() {
            let claimants = self.claimants(param, ctx);
            debug!(
                test = ctx.test_id(),
                param = param.name(),
                ?claimants,
                "parameter claimed by multiple resolvers"
            );
            return Err(ResolutionError::ambiguous(param, ctx, claimants));
        }

        trace!(
            test = ctx.test_id(),
            param = param.name(),
            resolver = resolver.name(),
            "resolving parameter"
        );
        let value = resolver.resolve(param, ctx)?;
        if !value.satisfies(param) {
            return Err(ResolutionError::type_mismatch(
                param.shape().to_string(),
                value.shape().to_string(),
            ));
        }
        Ok(value)
    }

    /// Resolves every slot in order, stopping at the first failure.
    pub fn resolve_all(
        &self,
        params: &[ParameterDescriptor],
        ctx: &InvocationContext,
    ) -> Result<Vec<ResolvedValue>, ResolutionError> {
        params.iter().map(|p| self.resolve(p, ctx)).collect()
    }

    /// A dispatcher consulting the registered resolvers first, then `extra`.
    pub fn with_extensions(&self, extra: &[Arc<dyn ParameterResolver>]) -> Dispatcher {
        let mut resolvers = self.resolvers.clone();
        resolvers.extend(extra.iter().cloned());
        Dispatcher {
            resolvers,
            policy: self.policy,
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn resolver_count(&self) -> usize {
        self.resolvers.len()
    }

    pub fn resolver_names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DispatcherBuilder {
    resolvers: Vec<Arc<dyn ParameterResolver>>,
    policy: MatchPolicy,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_resolver<R: ParameterResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    pub fn with_shared(mut self, resolver: Arc<dyn ParameterResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            resolvers: self.resolvers,
            policy: self.policy,
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
