pub mod ancestors;
pub mod index;
pub mod nesting;

pub use ancestors::{AncestorResolver, LinearizationContext, NamespaceGraph};
pub use index::{Index, IndexStats};
pub use nesting::{MethodScope, NestingContext, NestingResolver};
