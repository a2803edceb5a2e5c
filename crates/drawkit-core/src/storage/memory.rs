//! In-memory drawable store.

use super::{DrawableStore, PersistenceError, PersistenceResult, deserialize_drawable, serialize_drawable};
use crate::shapes::Drawable;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Keeps drawables as JSON, so loads go through the same checks as files.
#[derive(Debug, Default)]
pub struct MemoryStore {
    drawables: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Other(format!("Lock error: {}", e))
}

impl DrawableStore for MemoryStore {
    fn save(&self, id: &str, drawable: &Drawable) -> PersistenceResult<()> {
        let json = serialize_drawable(drawable)?;
        self.drawables.write().map_err(lock_error)?.insert(id.to_string(), json);
        Ok(())
    }

    fn load(&self, id: &str) -> PersistenceResult<Drawable> {
        let drawables = self.drawables.read().map_err(lock_error)?;
        let json = drawables.get(id).ok_or_else(|| PersistenceError::NotFound(id.to_string()))?;
        deserialize_drawable(json)
    }

    fn delete(&self, id: &str) -> PersistenceResult<()> {
        self.drawables.write().map_err(lock_error)?.remove(id);
        Ok(())
    }

    fn list(&self) -> PersistenceResult<Vec<String>> {
        Ok(self.drawables.read().map_err(lock_error)?.keys().cloned().collect())
    }

    fn exists(&self, id: &str) -> PersistenceResult<bool> {
        Ok(self.drawables.read().map_err(lock_error)?.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Area;
    use crate::shapes::{Figure, FigureKind, StyleParams};

    fn square() -> Drawable {
        Figure::new(FigureKind::Square, Area::new(5.0, 5.0, 30.0, 30.0), StyleParams::default()).into()
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let drawable = square();
        store.save("a", &drawable).unwrap();
        let loaded = store.load("a").unwrap();
        assert_eq!(loaded.id(), drawable.id());
        assert_eq!(loaded.area(), drawable.area());
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.load("missing"), Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn test_exists_delete_list() {
        let store = MemoryStore::new();
        store.save("b", &square()).unwrap();
        store.save("a", &square()).unwrap();
        assert_eq!(store.list().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.exists("a").unwrap());
        store.delete("a").unwrap();
        assert!(!store.exists("a").unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
