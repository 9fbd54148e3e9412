/// Reference resolution module.
///
/// Links relation arguments, event triggers and arguments, and attribute,
/// normalization and note targets to the entities and events they name.
mod resolver;

pub use resolver::{PendingAnnotations, ReferenceResolver, ResolvedAnnotations};
