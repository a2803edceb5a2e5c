//! Directory of JSON files, one per drawable.

use super::{DrawableStore, PersistenceError, PersistenceResult, deserialize_drawable, serialize_drawable};
use crate::shapes::Drawable;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each drawable as `<id>.json` inside a directory.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Open a store in `base_path`, creating the directory if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Directory the files live in.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn drawable_path(&self, id: &str) -> PathBuf {
        // Ids become file names.
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }
}

impl DrawableStore for FileStore {
    fn save(&self, id: &str, drawable: &Drawable) -> PersistenceResult<()> {
        let json = serialize_drawable(drawable)?;
        let path = self.drawable_path(id);
        fs::write(&path, json)?;
        log::debug!("Saved drawable {} to {}", id, path.display());
        Ok(())
    }

    fn load(&self, id: &str) -> PersistenceResult<Drawable> {
        let path = self.drawable_path(id);
        if !path.exists() {
            return Err(PersistenceError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(&path)?;
        deserialize_drawable(&json)
    }

    fn delete(&self, id: &str) -> PersistenceResult<()> {
        let path = self.drawable_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn list(&self) -> PersistenceResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_path)?.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &str) -> PersistenceResult<bool> {
        Ok(self.drawable_path(id).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{FreehandCurve, StyleParams};
    use kurbo::Point;

    fn stroke() -> Drawable {
        let points = vec![Point::new(10.0, 10.0), Point::new(40.0, 25.0), Point::new(60.0, 10.0)];
        FreehandCurve::from_points(points, StyleParams::default()).into()
    }

    #[test]
    fn test_save_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("drawables")).unwrap();
        let drawable = stroke();
        store.save("stroke-1", &drawable).unwrap();
        assert!(store.exists("stroke-1").unwrap());
        assert_eq!(store.list().unwrap(), vec!["stroke-1".to_string()]);

        let loaded = store.load("stroke-1").unwrap();
        assert_eq!(loaded.area(), drawable.area());

        store.delete("stroke-1").unwrap();
        assert!(matches!(store.load("stroke-1"), Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn test_ids_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        store.save("../escape", &stroke()).unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        fs::write(dir.path().join("bad.json"), "{\"Freehand\":").unwrap();
        assert!(matches!(store.load("bad"), Err(PersistenceError::Json(_))));
    }
}
