//! Entity trait: records with a stable, store-assigned identity.

/// A persisted record addressed by a typed id.
pub trait Entity {
    /// Strongly-typed record identifier.
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug;

    /// Human-readable resource name used in `not found` messages.
    const RESOURCE: &'static str;

    fn id(&self) -> Self::Id;
}
