//! Rasterising networks into images.
//!
//! A network is sampled on a `width × height` grid spanning `[-1, 1]` on both
//! axes. The first three outputs become the red, green and blue channels; a
//! single-output network renders as grayscale and missing channels stay dark.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

use crate::error::BoxError;
use crate::genome::Network;

/// Output scale mapping activations in `[0, 1]` onto `u8` intensities.
pub const DEFAULT_SCALE: f32 = 255.0;

/// Produces an image artifact for a network.
pub trait ImageRenderer {
    /// Render `network` under `label`, returning where the artifact lives.
    ///
    /// # Errors
    ///
    /// Implementations report failures writing the artifact.
    fn render(&mut self, network: &mut Network, label: &str) -> Result<PathBuf, BoxError>;
}

/// `n` evenly spaced samples from -1 to 1 inclusive. A single sample sits at
/// the centre.
fn axis(n: u32) -> impl Iterator<Item = f32> {
    let step = if n > 1 { 2.0 / (n - 1) as f32 } else { 0.0 };
    let start = if n > 1 { -1.0 } else { 0.0 };
    (0..n).map(move |i| start + step * i as f32)
}

#[inline]
fn to_channel(value: f32) -> u8 {
    // NaN maps to 0 through `as`
    value.clamp(0.0, 255.0) as u8
}

/// Sample `network` on a grid and pack the first three outputs into pixels.
///
/// Outputs are scaled by `scale` before clamping to `[0, 255]`.
pub fn render_raster_scaled(
    network: &mut Network,
    width: u32,
    height: u32,
    scale: f32,
) -> RgbImage {
    let mut outputs = vec![0.0; network.layout().num_outputs];
    let mut image = RgbImage::new(width, height);
    let grayscale = outputs.len() == 1;
    let num_inputs = network.layout().num_inputs();

    for (py, y) in axis(height).enumerate() {
        for (px, x) in axis(width).enumerate() {
            let coordinates = [x, y, x.hypot(y)];
            network.evaluate_into(&coordinates[..num_inputs], scale, &mut outputs);

            let channel = |c: usize| {
                let value = if grayscale {
                    outputs[0]
                } else {
                    outputs.get(c).copied().unwrap_or(0.0)
                };
                to_channel(value)
            };
            let pixel = Rgb([channel(0), channel(1), channel(2)]);
            image.put_pixel(px as u32, py as u32, pixel);
        }
    }

    image
}

/// [`render_raster_scaled`] with the default 0-255 output scale.
pub fn render_raster(network: &mut Network, width: u32, height: u32) -> RgbImage {
    render_raster_scaled(network, width, height, DEFAULT_SCALE)
}

/// Writes `<dir>/<label>.png` for each rendered network.
#[derive(Debug, Clone)]
pub struct PngRenderer {
    dir: PathBuf,
    width: u32,
    height: u32,
    scale: f32,
}

impl PngRenderer {
    /// A renderer writing `width × height` PNGs into `dir`.
    pub fn new(dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            dir: dir.into(),
            width,
            height,
            scale: DEFAULT_SCALE,
        }
    }

    /// Override the output scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Directory the images are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageRenderer for PngRenderer {
    fn render(&mut self, network: &mut Network, label: &str) -> Result<PathBuf, BoxError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{label}.png"));
        let image = render_raster_scaled(network, self.width, self.height, self.scale);
        image.save(&path)?;
        Ok(path)
    }
}
