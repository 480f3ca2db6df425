//! Entity trait: identity that survives state changes.

/// Something looked up and replaced by key rather than compared by value.
///
/// Catalog items are keyed by SKU, orders by order id. Engines use the key to
/// enforce "one record per identity" invariants.
pub trait Entity {
    /// Identifier type (`Sku`, `OrderId`, ...).
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

/// Position of the entity with `id` in `entities`.
pub fn position_of<E: Entity>(entities: &[E], id: &E::Id) -> Option<usize> {
    entities.iter().position(|e| e.id() == id)
}
