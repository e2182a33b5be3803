use crate::error::ResolutionError;
use crate::resolution::{
    InvocationContext, ParameterDescriptor, ParameterResolver, ResolvedValue, Supplier,
};

/// Claims `Supplier<T>` parameters.
///
/// The factory is not called during resolution; the consumer decides when
/// (and whether) to call `Supplier::get`.
pub struct SupplierResolver<T> {
    name: String,
    supplier: Supplier<T>,
}

impl<T: 'static> SupplierResolver<T> {
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            supplier: Supplier::new(factory),
        }
    }
}

impl<T: 'static> ParameterResolver for SupplierResolver<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, param: &ParameterDescriptor, _ctx: &InvocationContext) -> bool {
        param.is_supplier_of::<T>()
    }

    fn resolve(
        &self,
        _param: &ParameterDescriptor,
        _ctx: &InvocationContext,
    ) -> Result<ResolvedValue, ResolutionError> {
        Ok(ResolvedValue::supplier(self.supplier.clone()))
    }
}
