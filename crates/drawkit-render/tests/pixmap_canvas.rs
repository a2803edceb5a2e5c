//! Drawing through the canvas onto pixmap surfaces, then exporting.

use drawkit_core::input::Instant;
use drawkit_core::shapes::{ImageFormat, ImageSource};
use drawkit_core::storage::export_raster;
use drawkit_core::{Canvas, EngineConfig, Key, KeyInput, PointerEvent, RasterFormat, RasterImage, ToolKind};
use drawkit_render::{DecodingAssets, TextRenderer, codec, pixmap_canvas};
use kurbo::Point;
use std::sync::Arc;
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn canvas_with(assets: Arc<DecodingAssets>) -> Canvas {
    init_logging();
    let text = TextRenderer::load_system().map(Arc::new);
    pixmap_canvas(320, 240, text, assets, EngineConfig::default()).expect("pixmap canvas")
}

fn event(t0: Instant, x: f64, y: f64, ms: u64) -> PointerEvent {
    PointerEvent::new(Point::new(x, y), t0 + Duration::from_millis(ms)).pressed(true)
}

fn drag(canvas: &mut Canvas, t0: Instant, from: (f64, f64), to: (f64, f64), ms: u64) {
    canvas.pointer_down(&event(t0, from.0, from.1, ms));
    canvas.pointer_move(&event(t0, (from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0, ms + 30));
    canvas.pointer_move(&event(t0, to.0, to.1, ms + 60));
    canvas.pointer_up(&event(t0, to.0, to.1, ms + 90));
}

#[test]
fn freehand_and_square_export_to_png() {
    let mut canvas = canvas_with(Arc::new(DecodingAssets::new()));
    let t0 = Instant::now();
    drag(&mut canvas, t0, (20.0, 20.0), (120.0, 80.0), 0);
    canvas.set_tool(ToolKind::Square);
    drag(&mut canvas, t0, (150.0, 100.0), (250.0, 200.0), 200);
    canvas.key_down(&KeyInput::new(Key::Enter, t0 + Duration::from_millis(400)));
    assert_eq!(canvas.history().len(), 2);
    assert!(canvas.overlay().get_image_buffer(None).is_blank());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drawing.png");
    export_raster(canvas.main(), &path, RasterFormat::Png, 100).unwrap();
    let decoded = codec::decode(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));
    assert_eq!(decoded, canvas.main().get_image_buffer(None));
    // Square outline on its left edge; nothing far from any drawable.
    assert!(decoded.pixel(150, 150).is_some_and(|p| p[3] > 0));
    assert_eq!(decoded.pixel(300, 20).map(|p| p[3]), Some(0));

    let jpeg = canvas.export(RasterFormat::Jpeg, 80).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}

#[test]
fn image_tool_places_inline_png() {
    let mut source_pixels = RasterImage::new(40, 20);
    source_pixels.fill_rect(drawkit_core::PixelRect::new(0, 0, 40, 20), [0, 0, 255, 255]);
    let png = codec::encode(&source_pixels, RasterFormat::Png, 100).unwrap();

    let mut canvas = canvas_with(Arc::new(DecodingAssets::new()));
    let t0 = Instant::now();
    canvas.set_tool(ToolKind::Image);
    assert!(canvas.set_image(ImageSource::inline(ImageFormat::Png, &png, 40, 20)));
    canvas.pointer_down(&event(t0, 160.0, 120.0, 0));
    canvas.pointer_up(&event(t0, 160.0, 120.0, 20));
    let area = canvas.active_drawable().map(|d| d.area()).expect("image placed");
    assert!((area.width / area.height - 2.0).abs() < 0.01);
    assert!(area.contains(Point::new(160.0, 120.0)));

    assert!(canvas.validate());
    let main = canvas.main().get_image_buffer(None);
    let center = main.pixel(160, 120).unwrap_or_default();
    assert!(center[2] > 200 && center[0] < 50 && center[3] > 200, "{:?}", center);
}

#[test]
fn undo_restores_pixmap() {
    let mut canvas = canvas_with(Arc::new(DecodingAssets::new()));
    let t0 = Instant::now();
    drag(&mut canvas, t0, (20.0, 20.0), (100.0, 100.0), 0);
    let first = canvas.main().get_image_buffer(None);
    drag(&mut canvas, t0, (200.0, 20.0), (300.0, 200.0), 200);
    assert_ne!(canvas.main().get_image_buffer(None), first);

    assert!(canvas.undo_at(t0 + Duration::from_millis(1000)));
    assert_eq!(canvas.main().get_image_buffer(None), first);
}
