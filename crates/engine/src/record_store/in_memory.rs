use std::sync::{PoisonError, RwLock};

use freightnet_core::DomainResult;

use super::{RecordStore, Tables};

/// In-memory record store.
///
/// Intended for tests/dev. Not optimized for performance: every write clones
/// the tables, mutates the copy, and swaps it in only when the closure
/// succeeds, so a failed operation (or a panicking closure) never leaves
/// partial state behind. Readers under the same lock therefore only ever see
/// committed states.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryStore {
    fn read<T>(&self, f: impl FnOnce(&Tables) -> DomainResult<T>) -> DomainResult<T> {
        // Commits are atomic swaps, so a poisoned lock still guards a
        // consistent snapshot and can be recovered.
        let guard = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> DomainResult<T>) -> DomainResult<T> {
        let mut guard = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let mut working = guard.clone();
        let out = f(&mut working)?;
        *guard = working;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freightnet_core::{DomainError, ProductId};
    use freightnet_registry::Product;

    #[test]
    fn failed_write_leaves_tables_untouched() {
        let store = InMemoryStore::new();
        let id = ProductId::new();

        let err = store
            .write(|t| {
                let product = Product::new(id, "SKU-1", "Pallet", 1_000)?;
                t.products.insert(id, product);
                Err::<(), _>(DomainError::validation("boom"))
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        store
            .read(|t| {
                assert!(t.products.is_empty());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn successful_write_commits_all_mutations() {
        let store = InMemoryStore::new();
        let id = ProductId::new();

        store
            .write(|t| {
                t.products
                    .insert(id, Product::new(id, "SKU-1", "Pallet", 1_000)?);
                Ok(())
            })
            .unwrap();

        let sku = store.read(|t| Ok(t.product(id)?.sku.clone())).unwrap();
        assert_eq!(sku, "SKU-1");
    }
}
