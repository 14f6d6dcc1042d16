//! Built-in resolvers.

pub mod annotation;
pub mod dependency;
pub mod property_list;

pub use annotation::AnnotationResolver;
pub use dependency::{DependencyStructureResolver, Head};
pub use property_list::PropertyListResolver;
