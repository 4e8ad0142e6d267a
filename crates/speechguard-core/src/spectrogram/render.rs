//! Spectrogram → image / model input
//!
//! The image is grayscale replicated over RGB, with low frequencies at the
//! bottom and time running left to right.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use ndarray::Array4;

use super::error::Result;
use super::mel::Spectrogram;
use crate::tensor::rgb_to_tensor;

impl Spectrogram {
    /// Render at native resolution (`n_frames` wide, `n_mels` tall)
    pub fn to_gray_image(&self) -> GrayImage {
        let width = self.n_frames() as u32;
        let height = self.n_mels() as u32;
        let mut img = GrayImage::new(width, height);

        for (band, row) in self.data.rows().into_iter().enumerate() {
            let y = height - 1 - band as u32;
            for (frame, &value) in row.iter().enumerate() {
                let level = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
                img.put_pixel(frame as u32, y, Luma([level]));
            }
        }

        img
    }

    /// Render as an RGB image resized to `width` x `height`
    pub fn to_image(&self, width: u32, height: u32) -> RgbImage {
        let rgb = image::DynamicImage::ImageLuma8(self.to_gray_image()).to_rgb8();
        imageops::resize(&rgb, width, height, FilterType::Triangle)
    }

    /// Model input tensor `[1, 3, height, width]` with values in [0, 1]
    pub fn to_tensor(&self, width: u32, height: u32) -> Array4<f32> {
        rgb_to_tensor(&self.to_image(width, height))
    }

    /// Save the resized image as PNG
    pub fn save_png(&self, path: &Path, size: u32) -> Result<()> {
        self.to_image(size, size).save(path)?;
        Ok(())
    }
}
