//! Persistence of drawables and raster export.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

use crate::shapes::{Drawable, StyleParams};
use crate::surface::{RasterFormat, Surface, SurfaceError};
use kurbo::Point;
use thiserror::Error;

/// Persistence errors. Malformed input is rejected whole.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid drawable: {0}")]
    Invalid(String),
    #[error("Drawable not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result of persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Validate and serialize a drawable to JSON.
pub fn serialize_drawable(drawable: &Drawable) -> PersistenceResult<String> {
    check_drawable(drawable)?;
    Ok(serde_json::to_string(drawable)?)
}

/// Parse a drawable and check its geometry before handing it out.
pub fn deserialize_drawable(json: &str) -> PersistenceResult<Drawable> {
    let drawable: Drawable = serde_json::from_str(json)?;
    check_drawable(&drawable)?;
    Ok(drawable)
}

fn invalid(msg: impl Into<String>) -> PersistenceError {
    PersistenceError::Invalid(msg.into())
}

fn check_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> PersistenceResult<()> {
    if points.into_iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
        Ok(())
    } else {
        Err(invalid("non-finite point"))
    }
}

fn check_style(style: &StyleParams) -> PersistenceResult<()> {
    if !style.line_width.is_finite() || style.line_width < 0.0 {
        return Err(invalid(format!("line width {}", style.line_width)));
    }
    if !(0.0..=1.0).contains(&style.opacity) {
        return Err(invalid(format!("opacity {}", style.opacity)));
    }
    if let Some(text) = &style.text {
        if !text.font_size.is_finite() || text.font_size <= 0.0 {
            return Err(invalid(format!("font size {}", text.font_size)));
        }
    }
    Ok(())
}

fn check_drawable(drawable: &Drawable) -> PersistenceResult<()> {
    let area = drawable.area();
    if !area.is_valid() {
        return Err(invalid(format!("area {:?}", area)));
    }
    if !drawable.rotation().is_finite() {
        return Err(invalid("non-finite rotation"));
    }
    check_style(drawable.style())?;
    match drawable {
        Drawable::Freehand(curve) => {
            if curve.points().is_empty() {
                return Err(invalid("freehand curve without points"));
            }
            check_points(curve.points())
        }
        Drawable::Path(path) => check_points(&path.vertices()),
        Drawable::Figure(figure) => match figure.image_source() {
            Some(source) => source.validate().map_err(PersistenceError::Invalid),
            None => Ok(()),
        },
        Drawable::Selection(_) => Ok(()),
    }
}

/// Encode `surface` and write it to `path`.
pub fn export_raster(
    surface: &dyn Surface,
    path: &std::path::Path,
    format: RasterFormat,
    quality: u8,
) -> PersistenceResult<()> {
    let bytes = surface.to_encoded_image(format, quality)?;
    std::fs::write(path, &bytes)?;
    log::info!("Exported {} bytes of {:?} to {}", bytes.len(), format, path.display());
    Ok(())
}

/// Keyed storage for drawables.
pub trait DrawableStore: Send + Sync {
    fn save(&self, id: &str, drawable: &Drawable) -> PersistenceResult<()>;

    fn load(&self, id: &str) -> PersistenceResult<Drawable>;

    fn delete(&self, id: &str) -> PersistenceResult<()>;

    /// All stored ids, sorted.
    fn list(&self) -> PersistenceResult<Vec<String>>;

    fn exists(&self, id: &str) -> PersistenceResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Area;
    use crate::shapes::{ArrowStyle, Figure, FigureKind, FreehandCurve, PathShape, RgbaColor, SegmentKind, SelectionArea};
    use crate::surface::RecordingSurface;

    #[test]
    fn test_roundtrip_keeps_geometry_and_style() {
        let style = StyleParams { line_width: 4.0, color: RgbaColor::new(10, 20, 30, 255), ..StyleParams::default() };
        let points = vec![Point::new(0.0, 0.0), Point::new(2.0, 1.0), Point::new(5.0, 0.0)];
        let drawable: Drawable = FreehandCurve::from_points(points, style.clone()).into();

        let json = serialize_drawable(&drawable).unwrap();
        let back = deserialize_drawable(&json).unwrap();
        assert_eq!(back.area(), drawable.area());
        assert_eq!(back.style(), &style);
        assert_eq!(back.as_freehand().map(|c| c.points().to_vec()), drawable.as_freehand().map(|c| c.points().to_vec()));
        assert_eq!(back.id(), drawable.id());
    }

    fn roundtrip(drawable: &Drawable) -> Drawable {
        deserialize_drawable(&serialize_drawable(drawable).unwrap()).unwrap()
    }

    fn near(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    fn same_area(a: Area, b: Area) -> bool {
        near(Point::new(a.x, a.y), Point::new(b.x, b.y))
            && (a.width - b.width).abs() < 1e-9
            && (a.height - b.height).abs() < 1e-9
    }

    #[test]
    fn test_roundtrip_path_with_every_segment_kind() {
        let style = StyleParams { line_width: 3.0, ..StyleParams::default() };
        let mut path = PathShape::new(Point::new(10.0, 10.0), style.clone())
            .with_curvature(0.25)
            .with_arrow_style(ArrowStyle::default());
        path.push(SegmentKind::Line, Point::new(80.0, 15.0));
        path.push(SegmentKind::Curve, Point::new(90.0, 70.0));
        path.push(SegmentKind::Arrow, Point::new(30.0, 60.0));
        path.close(10.0);
        let drawable: Drawable = path.into();

        let back = roundtrip(&drawable);
        let (before, after) = (drawable.as_path().unwrap(), back.as_path().unwrap());
        assert!(after.is_closed());
        assert!(same_area(back.area(), drawable.area()));
        assert_eq!(back.style(), &style);
        assert_eq!(after.segments().len(), before.segments().len());
        for (a, b) in after.segments().iter().zip(before.segments()) {
            assert_eq!(std::mem::discriminant(a), std::mem::discriminant(b));
            assert!(near(a.end(), b.end()));
            assert_eq!(a.control().is_some(), b.control().is_some());
        }
        assert!(after.vertices().iter().zip(before.vertices()).all(|(a, b)| near(*a, b)));
    }

    #[test]
    fn test_roundtrip_figure_keeps_rotation_and_text() {
        let mut figure = Figure::new(FigureKind::Text, Area::new(20.0, 30.0, 120.0, 40.0), StyleParams::default());
        figure.set_text("hello there");
        figure.set_rotation(33.75);
        let drawable: Drawable = figure.into();

        let back = roundtrip(&drawable);
        let figure = back.as_figure().unwrap();
        assert_eq!(figure.kind(), FigureKind::Text);
        assert_eq!(figure.text(), "hello there");
        assert!((back.rotation() - 33.75).abs() < 1e-9);
        assert!(same_area(back.area(), drawable.area()));
        assert_eq!(back.id(), drawable.id());
    }

    #[test]
    fn test_roundtrip_selection_drops_pixels() {
        let mut selection = SelectionArea::new(Area::new(5.0, 6.0, 70.0, 40.0), StyleParams::default());
        selection.set_buffer(Some(crate::surface::RasterImage::new(70, 40)));
        let drawable: Drawable = selection.into();

        let back = roundtrip(&drawable);
        let selection = back.as_selection().unwrap();
        assert!(!selection.has_buffer());
        assert!(same_area(back.area(), drawable.area()));
        assert_eq!(back.id(), drawable.id());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(deserialize_drawable("{not json"), Err(PersistenceError::Json(_))));
        assert!(matches!(deserialize_drawable("{\"Unknown\":{}}"), Err(PersistenceError::Json(_))));
    }

    #[test]
    fn test_rejects_invalid_area() {
        let figure = Figure::new(FigureKind::Square, Area::new(0.0, 0.0, 40.0, 40.0), StyleParams::default());
        let json = serialize_drawable(&figure.into()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["Figure"]["area"]["width"] = serde_json::json!(-5.0);
        let err = deserialize_drawable(&value.to_string()).unwrap_err();
        assert!(matches!(err, PersistenceError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_opacity() {
        let mut style = StyleParams::default();
        style.opacity = 3.0;
        let figure = Figure::new(FigureKind::Circle, Area::new(0.0, 0.0, 40.0, 40.0), style);
        assert!(matches!(serialize_drawable(&figure.into()), Err(PersistenceError::Invalid(_))));
    }

    #[test]
    fn test_export_unsupported_surface() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let surface = RecordingSurface::new(10, 10);
        let err = export_raster(&surface, &path, RasterFormat::Png, 90).unwrap_err();
        assert!(matches!(err, PersistenceError::Surface(SurfaceError::Unsupported(_))));
        assert!(!path.exists());
    }
}
