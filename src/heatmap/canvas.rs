//! Drawing surface for heatmap overlays
//!
//! `RasterCanvas` keeps premultiplied RGBA in `f32` so that many overlapping
//! splats can be accumulated with screen blending before quantising to 8 bits.

use super::gradient::Gradient;
use crate::error::{TrackerError, TrackerResult};
use image::{ImageFormat, Rgba as ImageRgba, RgbaImage};
use std::path::Path;

/// Surface the renderer draws splats onto
pub trait Canvas {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Reset every pixel to fully transparent
    fn clear(&mut self);

    fn resize(&mut self, width: u32, height: u32);

    /// Draw one radial splat centred at `(x, y)`. Returns `false` when the
    /// splat lies entirely outside the surface and nothing was drawn.
    fn draw_splat(&mut self, x: f64, y: f64, gradient: &Gradient) -> bool;
}

#[derive(Debug, Clone)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    /// Premultiplied RGBA, row-major
    pixels: Vec<[f32; 4]>,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y)).copied()
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| p[3] == 0.0)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Quantise to straight-alpha 8-bit RGBA
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let [r, g, b, a] = self.pixels[self.index(x, y)];
            if a <= 0.0 {
                return ImageRgba([0, 0, 0, 0]);
            }
            ImageRgba([
                to_u8(r / a),
                to_u8(g / a),
                to_u8(b / a),
                to_u8(a),
            ])
        })
    }

    pub fn save_png(&self, path: &Path) -> TrackerResult<()> {
        self.to_image()
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| TrackerError::RenderError(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Wrote {}x{} heatmap to {}", self.width, self.height, path.display());
        Ok(())
    }
}

fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// `out = src + dst - src * dst`, per premultiplied channel
fn screen(src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
    [
        src[0] + dst[0] - src[0] * dst[0],
        src[1] + dst[1] - src[1] * dst[1],
        src[2] + dst[2] - src[2] * dst[2],
        src[3] + dst[3] - src[3] * dst[3],
    ]
}

impl Canvas for RasterCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![[0.0; 4]; width as usize * height as usize];
    }

    fn draw_splat(&mut self, x: f64, y: f64, gradient: &Gradient) -> bool {
        let radius = gradient.radius;
        if !x.is_finite() || !y.is_finite() || self.width == 0 || self.height == 0 {
            return false;
        }
        if x + radius < 0.0
            || y + radius < 0.0
            || x - radius >= self.width as f64
            || y - radius >= self.height as f64
        {
            return false;
        }

        let min_x = (x - radius).floor().max(0.0) as u32;
        let min_y = (y - radius).floor().max(0.0) as u32;
        let max_x = ((x + radius).ceil().max(0.0) as u32).min(self.width.saturating_sub(1));
        let max_y = ((y + radius).ceil().max(0.0) as u32).min(self.height.saturating_sub(1));

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                // Sample at the pixel centre
                let dx = px as f64 + 0.5 - x;
                let dy = py as f64 + 0.5 - y;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance > radius {
                    continue;
                }

                let color = gradient.sample((distance / radius) as f32).premultiplied();
                let index = self.index(px, py);
                self.pixels[index] = screen(color, self.pixels[index]);
            }
        }
        true
    }
}
