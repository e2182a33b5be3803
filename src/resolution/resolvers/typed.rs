use crate::error::ResolutionError;
use crate::resolution::{InvocationContext, ParameterDescriptor, ParameterResolver, ResolvedValue};

type Factory<T> = Box<dyn Fn(&ParameterDescriptor, &InvocationContext) -> T + Send + Sync>;

/// Claims parameters declared as exactly `T`.
pub struct TypedResolver<T> {
    name: String,
    factory: Factory<T>,
}

impl<T: Send + 'static> TypedResolver<T> {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(move |_: &ParameterDescriptor, _: &InvocationContext| factory()),
        }
    }

    /// Like `new`, but the factory sees the slot and invocation it fills.
    pub fn with_context<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&ParameterDescriptor, &InvocationContext) -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
        }
    }
}

impl<T: Send + 'static> ParameterResolver for TypedResolver<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, param: &ParameterDescriptor, _ctx: &InvocationContext) -> bool {
        param.is_value_of::<T>()
    }

    fn resolve(
        &self,
        param: &ParameterDescriptor,
        ctx: &InvocationContext,
    ) -> Result<ResolvedValue, ResolutionError> {
        Ok(ResolvedValue::value((self.factory)(param, ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_only_its_type() {
        let resolver = TypedResolver::new("answer", || 42_i32);
        let ctx = InvocationContext::new("typed");

        assert!(resolver.supports(&ParameterDescriptor::value::<i32>(0, "a"), &ctx));
        assert!(!resolver.supports(&ParameterDescriptor::value::<i64>(0, "a"), &ctx));
        assert!(!resolver.supports(&ParameterDescriptor::sequence::<i32>(0, "a"), &ctx));
    }

    #[test]
    fn test_factory_sees_context() {
        let resolver = TypedResolver::with_context("echo", |param, ctx| {
            format!("{}#{}", ctx.test_id(), param.name())
        });
        let ctx = InvocationContext::new("suite::case");
        let param = ParameterDescriptor::value::<String>(0, "label");

        let value = resolver.resolve(&param, &ctx).unwrap();
        assert_eq!(value.into_value::<String>().unwrap(), "suite::case#label");
    }
}
