use crate::error::ResolutionError;
use crate::resolution::{InvocationContext, ParameterDescriptor, ParameterResolver, ResolvedValue};

type Factory<T> = Box<dyn Fn() -> Vec<T> + Send + Sync>;

/// Claims any parameter declared as a sequence of `T`.
pub struct SequenceResolver<T> {
    name: String,
    factory: Factory<T>,
}

impl<T: Send + 'static> SequenceResolver<T> {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Vec<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Box::new(factory),
        }
    }
}

impl<T: Send + 'static> ParameterResolver for SequenceResolver<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, param: &ParameterDescriptor, _ctx: &InvocationContext) -> bool {
        param.is_sequence_of::<T>()
    }

    fn resolve(
        &self,
        _param: &ParameterDescriptor,
        _ctx: &InvocationContext,
    ) -> Result<ResolvedValue, ResolutionError> {
        Ok(ResolvedValue::sequence((self.factory)()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_fresh_sequence_each_time() {
        let resolver = SequenceResolver::new("names", || vec!["foo", "bar"]);
        let ctx = InvocationContext::new("sequence");
        let param = ParameterDescriptor::sequence::<&'static str>(0, "list");

        assert!(resolver.supports(&param, &ctx));
        for _ in 0..2 {
            let items = resolver
                .resolve(&param, &ctx)
                .unwrap()
                .into_sequence::<&'static str>()
                .unwrap();
            assert_eq!(items, vec!["foo", "bar"]);
        }
    }
}
