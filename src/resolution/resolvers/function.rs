use crate::error::ResolutionError;
use crate::resolution::{InvocationContext, ParameterDescriptor, ParameterResolver, ResolvedValue};

type Predicate = Box<dyn Fn(&ParameterDescriptor, &InvocationContext) -> bool + Send + Sync>;
type Factory = Box<
    dyn Fn(&ParameterDescriptor, &InvocationContext) -> Result<ResolvedValue, ResolutionError>
        + Send
        + Sync,
>;

/// Resolver built from a predicate closure and a fallible factory closure.
pub struct FnResolver {
    name: String,
    predicate: Predicate,
    factory: Factory,
}

impl FnResolver {
    pub fn new<P, F>(name: impl Into<String>, predicate: P, factory: F) -> Self
    where
        P: Fn(&ParameterDescriptor, &InvocationContext) -> bool + Send + Sync + 'static,
        F: Fn(&ParameterDescriptor, &InvocationContext) -> Result<ResolvedValue, ResolutionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            factory: Box::new(factory),
        }
    }

    /// Claims parameters by slot name, whatever their shape.
    pub fn by_name<F>(name: impl Into<String>, param_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ParameterDescriptor, &InvocationContext) -> Result<ResolvedValue, ResolutionError>
            + Send
            + Sync
            + 'static,
    {
        let param_name = param_name.into();
        Self::new(name, move |param, _| param.name() == param_name, factory)
    }
}

impl ParameterResolver for FnResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, param: &ParameterDescriptor, ctx: &InvocationContext) -> bool {
        (self.predicate)(param, ctx)
    }

    fn resolve(
        &self,
        param: &ParameterDescriptor,
        ctx: &InvocationContext,
    ) -> Result<ResolvedValue, ResolutionError> {
        (self.factory)(param, ctx)
    }
}
