pub mod marker;
pub mod persistence;
pub mod store;

pub use marker::{Marker, MarkerId, MarkerPatch, PersistedMarker, DEFAULT_ELEMENT_TYPE};
pub use persistence::{InMemoryRepository, MarkerRepository, MarkerSync};
pub use store::{MarkerSnapshot, MarkerStore};
