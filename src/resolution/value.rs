/// Values handed out by resolvers.
///
/// A `ResolvedValue` owns a type-erased payload together with the shape it
/// was produced for. Consumers take the concrete value back out with one of
/// the `into_*` methods and get a `TypeMismatch` if they ask for the wrong type.
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::descriptor::{ParameterDescriptor, Shape, TypeKey};
use crate::error::ResolutionError;

pub struct ResolvedValue {
    shape: Shape,
    inner: Box<dyn Any + Send>,
}

impl ResolvedValue {
    pub fn value<T: Send + 'static>(value: T) -> Self {
        Self {
            shape: Shape::Value(TypeKey::of::<T>()),
            inner: Box::new(value),
        }
    }

    pub fn sequence<T: Send + 'static>(items: Vec<T>) -> Self {
        Self {
            shape: Shape::Sequence(TypeKey::of::<T>()),
            inner: Box::new(items),
        }
    }

    pub fn supplier<T: 'static>(supplier: Supplier<T>) -> Self {
        Self {
            shape: Shape::Supplier(TypeKey::of::<T>()),
            inner: Box::new(supplier),
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn satisfies(&self, param: &ParameterDescriptor) -> bool {
        self.shape == *param.shape()
    }

    pub fn into_value<T: 'static>(self) -> Result<T, ResolutionError> {
        self.downcast::<T>()
    }

    pub fn into_sequence<T: 'static>(self) -> Result<Vec<T>, ResolutionError> {
        self.downcast::<Vec<T>>()
    }

    pub fn into_supplier<T: 'static>(self) -> Result<Supplier<T>, ResolutionError> {
        self.downcast::<Supplier<T>>()
    }

    fn downcast<T: 'static>(self) -> Result<T, ResolutionError> {
        let Self { shape, inner } = self;
        inner
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| ResolutionError::type_mismatch(std::any::type_name::<T>(), shape.to_string()))
    }
}

impl fmt::Debug for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedValue")
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Deferred factory. Nothing runs until `get` is called.
pub struct Supplier<T> {
    factory: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T> Supplier<T> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }

    pub fn get(&self) -> T {
        (self.factory)()
    }
}

impl<T> Clone for Supplier<T> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for Supplier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Supplier<{}>", std::any::type_name::<T>())
    }
}
