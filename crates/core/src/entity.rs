//! Entity trait: identity that survives field changes.

/// Minimal entity interface.
///
/// Repositories use the identifier to detect duplicates, so it must cover
/// exactly the fields the storage treats as the primary key.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}
