use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::{debug, info};

use super::interface::{RenderInterface, RenderedImage};
use crate::config::RenderConfig;
use crate::error::{AppError, AppResult};

const FILL_ALPHA: f32 = 0.9;
const STROKE_ALPHA: f32 = 0.8;
const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];

/// Draws a rounded, semi-transparent caption box near the top of the image
/// with the translated text centred in it, then re-encodes as JPEG.
#[derive(Clone)]
pub struct OverlayRenderer {
    font: FontArc,
    config: RenderConfig,
}

impl OverlayRenderer {
    pub fn new(font: FontArc, config: RenderConfig) -> Self {
        Self { font, config }
    }

    /// Load the caption font named in the config
    pub fn from_config(config: &RenderConfig) -> anyhow::Result<Self> {
        let data = std::fs::read(&config.font_path)
            .with_context(|| format!("Failed to read font {}", config.font_path))?;
        let font = FontArc::try_from_vec(data)
            .with_context(|| format!("Invalid font file {}", config.font_path))?;
        info!("Loaded overlay font from {}", config.font_path);
        Ok(Self::new(font, config.clone()))
    }

    pub fn render(&self, image: &[u8], text: &str) -> AppResult<RenderedImage> {
        let mut canvas = decode_flattened(image)?;
        let (width, height) = canvas.dimensions();
        debug!("Compositing overlay onto {}x{} image", width, height);

        if let Some(area) = overlay_area(width, &self.config) {
            draw_rounded_box(
                &mut canvas,
                area,
                self.config.corner_radius as f32,
                self.config.stroke_width as f32,
            );
        }
        draw_centered_text(
            &mut canvas,
            &self.font,
            self.config.font_size,
            text,
            width as f32 / 2.0,
            self.config.text_baseline as f32,
        );

        // canvas is fully opaque here, so dropping alpha loses nothing
        let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.config.jpeg_quality).encode_image(&rgb)?;

        Ok(RenderedImage { bytes, width, height })
    }
}

#[async_trait]
impl RenderInterface for OverlayRenderer {
    async fn composite(&self, image: Bytes, text: &str) -> AppResult<RenderedImage> {
        let renderer = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || renderer.render(&image, &text))
            .await
            .map_err(|e| AppError::Render(format!("render task failed: {}", e)))?
    }
}

/// Decode and composite over opaque black, the way JPEG output flattens
/// transparency.
pub fn decode_flattened(image: &[u8]) -> AppResult<RgbaImage> {
    let mut canvas = image::load_from_memory(image)?.to_rgba8();
    flatten_onto_black(&mut canvas);
    Ok(canvas)
}

fn flatten_onto_black(canvas: &mut RgbaImage) {
    for pixel in canvas.pixels_mut() {
        let alpha = pixel.0[3] as u32;
        for channel in &mut pixel.0[..3] {
            *channel = ((*channel as u32 * alpha + 127) / 255) as u8;
        }
        pixel.0[3] = 255;
    }
}

/// Box at (margin, margin) spanning `width - 2 * margin`. None when the
/// image is too narrow to hold it.
pub fn overlay_area(width: u32, config: &RenderConfig) -> Option<Rect> {
    let box_width = width
        .checked_sub(config.margin.checked_mul(2)?)
        .filter(|w| *w > 0)?;
    Some(
        Rect::at(config.margin as i32, config.margin as i32)
            .of_size(box_width, config.box_height),
    )
}

/// Signed distance from (px, py) to the edge of a rounded rectangle;
/// negative inside.
fn rounded_rect_distance(px: f32, py: f32, area: Rect, radius: f32) -> f32 {
    let half_w = area.width() as f32 / 2.0;
    let half_h = area.height() as f32 / 2.0;
    let cx = area.left() as f32 + half_w;
    let cy = area.top() as f32 + half_h;

    let qx = (px - cx).abs() - (half_w - radius);
    let qy = (py - cy).abs() - (half_h - radius);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - radius
}

fn blend(pixel: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    for (channel, source) in pixel.0.iter_mut().zip(color) {
        *channel = (source as f32 * alpha + *channel as f32 * (1.0 - alpha)).round() as u8;
    }
    let dest_alpha = pixel.0[3] as f32 / 255.0;
    pixel.0[3] = ((alpha + dest_alpha * (1.0 - alpha)) * 255.0).round() as u8;
}

/// Fill then stroke a rounded rectangle. The stroke straddles the edge.
pub fn draw_rounded_box(canvas: &mut RgbaImage, area: Rect, radius: f32, stroke_width: f32) {
    let (width, height) = canvas.dimensions();
    let half_stroke = stroke_width / 2.0;
    let pad = half_stroke.ceil() as i32;

    let x0 = (area.left() - pad).max(0);
    let y0 = (area.top() - pad).max(0);
    let x1 = (area.right() + 1 + pad).min(width as i32);
    let y1 = (area.bottom() + 1 + pad).min(height as i32);

    for y in y0..y1 {
        for x in x0..x1 {
            let d = rounded_rect_distance(x as f32 + 0.5, y as f32 + 0.5, area, radius);
            let pixel = canvas.get_pixel_mut(x as u32, y as u32);
            if d <= 0.0 {
                blend(pixel, WHITE, FILL_ALPHA);
            }
            if d.abs() <= half_stroke {
                blend(pixel, BLACK, STROKE_ALPHA);
            }
        }
    }
}

/// Whitespace runs become single spaces, the way SVG lays out `<text>`.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn draw_centered_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    font_size: f32,
    text: &str,
    center_x: f32,
    baseline: f32,
) {
    let line = collapse_whitespace(text);
    if line.is_empty() {
        return;
    }

    let scale = PxScale::from(font_size);
    let (text_width, _) = text_size(scale, font, &line);
    let ascent = font.as_scaled(scale).ascent();
    let x = (center_x - text_width as f32 / 2.0).round() as i32;
    let y = (baseline - ascent).round() as i32;
    draw_text_mut(canvas, Rgba([0, 0, 0, 255]), x, y, scale, font, &line);
}
