//! drawkit core library
//!
//! Geometry, drawables, interaction handlers and undo history for an
//! immediate-mode raster drawing canvas. Rendering goes through the
//! [`Surface`] trait; `drawkit-render` provides a pixmap backend.

pub mod assets;
pub mod canvas;
pub mod config;
pub mod geometry;
pub mod history;
pub mod input;
pub mod raster;
pub mod render;
pub mod shapes;
pub mod snap;
pub mod storage;
pub mod surface;
pub mod tools;

pub use assets::{AssetResolver, MemoryAssets, NoAssets};
pub use canvas::Canvas;
pub use config::{ConfigError, EngineConfig};
pub use geometry::{Area, Border, ControlButton, CursorHint};
pub use history::{History, HistorySnapshot, Restore};
pub use input::{Key, KeyInput, Modifiers, MouseButton, PointerEvent};
pub use raster::{PixelRect, RasterImage};
pub use shapes::{Drawable, DrawableTrait, Figure, FigureKind, FreehandCurve, PathShape, SelectionArea, StyleParams};
pub use snap::{SnapResult, snap_to_grid, snap_to_points};
pub use storage::{DrawableStore, MemoryStore, PersistenceError, deserialize_drawable, serialize_drawable};
pub use surface::{RasterFormat, RecordingSurface, Surface, SurfaceError};
pub use tools::{GesturePhase, SelectionAction, ToolKind};
