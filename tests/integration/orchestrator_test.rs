//! End-to-end watermark requests: validation, fetch, anchor resolution and
//! compositing, with remote images served by a local mock server.

use super::test_harness::*;
use httpmock::prelude::*;
use image::Rgba;
use watermarking::logging::LogLevel;
use watermarking::watermark::{Anchor, WatermarkError, WatermarkKind, WatermarkRequest};

fn text_request(source: &str, position: Option<i32>) -> WatermarkRequest {
    WatermarkRequest::from_parts(source, None, Some("Sample"), Some("Arial"), 45.0, position)
        .unwrap()
}

fn image_request(source: &str, watermark: &str, angle: f32, position: i32) -> WatermarkRequest {
    WatermarkRequest::from_parts(source, Some(watermark), None, None, angle, Some(position))
        .unwrap()
}

#[tokio::test]
async fn test_text_watermark_on_800x600_top_left() {
    let server = MockServer::start_async().await;
    let source = serve_png(&server, "/800/600", 800, 600, WHITE).await;
    let harness = TestProcessor::without_fonts();

    let request = text_request(&server.url("/800/600"), Some(1));
    let result = harness.processor.run(&request).await;

    assert!(result.is_success());
    let raster = result.into_raster().unwrap();
    assert_eq!(raster.dimensions(), (800, 600));
    assert_eq!(
        harness.processor.resolve_anchor(&raster, &request),
        Anchor::new(200.0, 200.0)
    );
    assert_eq!(source.hits_async().await, 1);

    // Arial is not registered, so the draw faults and is only logged.
    let errors = harness.logger.entries_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains(" ms"));
    assert!(errors[0].fault.as_deref().unwrap().contains("Arial"));
}

#[tokio::test]
async fn test_both_watermark_inputs_rejected_before_any_fetch() {
    let server = MockServer::start_async().await;
    let source = serve_png(&server, "/source.png", 800, 600, WHITE).await;
    let logo = serve_png(&server, "/logo.png", 10, 10, RED).await;

    let result = WatermarkRequest::from_parts(
        &server.url("/source.png"),
        Some(&server.url("/logo.png")),
        Some("Sample"),
        Some("Arial"),
        0.0,
        None,
    );

    let err = result.unwrap_err();
    assert!(matches!(err, WatermarkError::Validation(_)));
    assert_eq!(err.status_hint(), Some(400));
    assert_eq!(source.hits_async().await, 0);
    assert_eq!(logo.hits_async().await, 0);
}

#[tokio::test]
async fn test_image_watermark_blended_at_anchor() {
    let server = MockServer::start_async().await;
    serve_png(&server, "/source.png", 800, 600, WHITE).await;
    serve_png(&server, "/logo.png", 100, 50, RED).await;
    let harness = TestProcessor::without_fonts();

    let request = image_request(&server.url("/source.png"), &server.url("/logo.png"), 0.0, 1);
    let result = harness.processor.run(&request).await;

    let raster = result.into_raster().unwrap();
    assert_eq!(raster.dimensions(), (800, 600));

    let image = raster.as_image();
    let blended = Rgba([255, 128, 128, 255]);
    assert_eq!(*image.get_pixel(199, 199), WHITE);
    assert_eq!(*image.get_pixel(200, 200), blended);
    assert_eq!(*image.get_pixel(299, 249), blended);
    assert_eq!(*image.get_pixel(300, 250), WHITE);

    assert!(harness.logger.contains("Image watermarking took"));
    assert!(harness.logger.entries_at(LogLevel::Error).is_empty());
}

#[tokio::test]
async fn test_rotated_image_watermark_keeps_source_dimensions() {
    let server = MockServer::start_async().await;
    serve_png(&server, "/source.png", 800, 600, WHITE).await;
    serve_png(&server, "/logo.png", 200, 100, RED).await;
    let harness = TestProcessor::without_fonts();

    for position in 1..=9 {
        let request =
            image_request(&server.url("/source.png"), &server.url("/logo.png"), 45.0, position);
        let result = harness.processor.run(&request).await;
        assert_eq!(result.raster().unwrap().dimensions(), (800, 600));
    }
}

#[tokio::test]
async fn test_oversized_watermark_rejected_without_rendering() {
    let server = MockServer::start_async().await;
    serve_png(&server, "/source.png", 100, 100, WHITE).await;
    let logo = serve_png(&server, "/logo.png", 100, 101, RED).await;
    let harness = TestProcessor::without_fonts();

    let request = image_request(&server.url("/source.png"), &server.url("/logo.png"), 30.0, 5);
    let result = harness.processor.run(&request).await;

    assert!(!result.is_success());
    assert_eq!(result.status_code(), Some(400));
    assert_eq!(
        result.error_message().as_deref(),
        Some("The watermark image is larger than the main image. Please use a smaller watermark.")
    );
    assert_eq!(logo.hits_async().await, 1);
    assert!(harness.logger.is_empty());
}

#[tokio::test]
async fn test_source_failure_short_circuits() {
    let server = MockServer::start_async().await;
    serve(&server, "/source.png", 404, "text/html", b"missing".to_vec()).await;
    let logo = serve_png(&server, "/logo.png", 10, 10, RED).await;
    let harness = TestProcessor::without_fonts();

    let request = image_request(&server.url("/source.png"), &server.url("/logo.png"), 0.0, 1);
    let result = harness.processor.run(&request).await;

    assert_eq!(result.status_code(), Some(404));
    assert_eq!(logo.hits_async().await, 0);
    assert!(harness.logger.is_empty());
}

#[tokio::test]
async fn test_watermark_failure_is_returned_unchanged() {
    let server = MockServer::start_async().await;
    serve_png(&server, "/source.png", 100, 100, WHITE).await;
    serve(&server, "/logo.txt", 200, "text/plain", b"logo".to_vec()).await;
    let harness = TestProcessor::without_fonts();

    let request = image_request(&server.url("/source.png"), &server.url("/logo.txt"), 0.0, 1);
    let result = harness.processor.run(&request).await;

    assert_eq!(result.status_code(), Some(415));
    assert_eq!(
        result.error_message().as_deref(),
        Some("Unsupported content type: text/plain")
    );
}

#[tokio::test]
async fn test_rotation_fault_still_succeeds_and_logs_duration() {
    let server = MockServer::start_async().await;
    serve_png(&server, "/source.png", 400, 300, WHITE).await;
    serve_png(&server, "/logo.png", 20, 20, RED).await;
    let harness = TestProcessor::without_fonts();

    let request =
        image_request(&server.url("/source.png"), &server.url("/logo.png"), f32::NAN, 1);
    let result = harness.processor.run(&request).await;

    assert!(result.is_success());
    let errors = harness.logger.entries_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.starts_with("Image watermarking failed after "));
    assert!(errors[0].message.ends_with(" ms"));
}

#[tokio::test]
async fn test_run_to_jpeg() {
    let server = MockServer::start_async().await;
    serve_png(&server, "/source.png", 800, 600, WHITE).await;
    let harness = TestProcessor::without_fonts();

    let jpeg = harness
        .processor
        .run_to_jpeg(&text_request(&server.url("/source.png"), None), 80)
        .await
        .unwrap();

    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let decoded = image::load_from_memory(&jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (800, 600));
}

#[tokio::test]
async fn test_text_drawn_up_and_left_of_anchor() {
    let server = MockServer::start_async().await;
    serve_png(&server, "/source.png", 800, 600, WHITE).await;
    let harness = TestProcessor::with_fixture_font();

    let request = WatermarkRequest::from_parts(
        &server.url("/source.png"),
        None,
        Some("Sample"),
        Some(FIXTURE_FONT_FAMILY),
        0.0,
        Some(9),
    )
    .unwrap();
    assert_eq!(request.kind, WatermarkKind::Text("Sample".to_string()));

    let result = harness.processor.run(&request).await;
    let raster = result.into_raster().unwrap();
    let anchor = harness.processor.resolve_anchor(&raster, &request);
    assert_eq!(anchor, Anchor::new(600.0, 400.0));

    let (min_x, min_y, max_x, max_y) =
        changed_bounds(raster.as_image(), WHITE).expect("text should be drawn");

    // Lower-right corner of the ink sits just inside the anchor.
    assert!(max_x <= 602 && max_x >= 570, "max_x = {max_x}");
    assert!(max_y <= 402 && max_y >= 370, "max_y = {max_y}");
    // Six glyphs at 108px are far wider and taller than a few pixels.
    assert!(min_x < 300 && min_y < 330, "min = ({min_x}, {min_y})");

    // Green at half alpha over white never raises red above green.
    assert!(raster.as_image().pixels().all(|p| p[1] >= p[0]));

    assert!(harness.logger.contains("Text watermarking took"));
    assert!(harness.logger.entries_at(LogLevel::Error).is_empty());
}
