// Ready-made resolvers.
//
// Each one is an explicit predicate + factory pair:
// - TypedResolver    - claims a plain `T`
// - SupplierResolver - claims a `Supplier<T>`, hands out the factory unevaluated
// - SequenceResolver - claims a `Vec<T>`
// - FnResolver       - arbitrary predicate and fallible factory

pub mod function;
pub mod sequence;
pub mod supplier;
pub mod typed;

pub use function::FnResolver;
pub use sequence::SequenceResolver;
pub use supplier::SupplierResolver;
pub use typed::TypedResolver;
