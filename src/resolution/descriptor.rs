/// Declared shape of one invocation-time argument slot.
///
/// Types are identified by `TypeKey` rather than by name matching, so two
/// distinct types that happen to share a short name never collide.
use std::any::TypeId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A plain `T`
    Value(TypeKey),
    /// A `Vec<T>`
    Sequence(TypeKey),
    /// A `Supplier<T>` evaluated by the consumer
    Supplier(TypeKey),
}

impl Shape {
    pub fn element(&self) -> TypeKey {
        match self {
            Shape::Value(key) | Shape::Sequence(key) | Shape::Supplier(key) => *key,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Value(_) => "value",
            Shape::Sequence(_) => "sequence",
            Shape::Supplier(_) => "supplier",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Value(key) => write!(f, "{key}"),
            Shape::Sequence(key) => write!(f, "sequence<{key}>"),
            Shape::Supplier(key) => write!(f, "supplier<{key}>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    index: usize,
    name: String,
    shape: Shape,
}

impl ParameterDescriptor {
    pub fn new(index: usize, name: impl Into<String>, shape: Shape) -> Self {
        Self {
            index,
            name: name.into(),
            shape,
        }
    }

    pub fn value<T: 'static>(index: usize, name: impl Into<String>) -> Self {
        Self::new(index, name, Shape::Value(TypeKey::of::<T>()))
    }

    pub fn sequence<T: 'static>(index: usize, name: impl Into<String>) -> Self {
        Self::new(index, name, Shape::Sequence(TypeKey::of::<T>()))
    }

    pub fn supplier<T: 'static>(index: usize, name: impl Into<String>) -> Self {
        Self::new(index, name, Shape::Supplier(TypeKey::of::<T>()))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_value_of<T: 'static>(&self) -> bool {
        matches!(self.shape, Shape::Value(key) if key.is::<T>())
    }

    pub fn is_sequence_of<T: 'static>(&self) -> bool {
        matches!(self.shape, Shape::Sequence(key) if key.is::<T>())
    }

    pub fn is_supplier_of<T: 'static>(&self) -> bool {
        matches!(self.shape, Shape::Supplier(key) if key.is::<T>())
    }
}
