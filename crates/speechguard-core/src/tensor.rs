//! Image → NCHW input tensors
//!
//! The classification model takes `[batch, 3, height, width]` in [0, 1] with no
//! mean/std normalization.

use std::path::Path;

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;

/// Input shape used when the model does not declare a static one
pub const DEFAULT_INPUT_SHAPE: [usize; 4] = [1, 3, 224, 224];

/// Convert an RGB image to a `[1, 3, H, W]` tensor scaled to [0, 1]
pub fn rgb_to_tensor(img: &RgbImage) -> Array4<f32> {
    let (width, height) = img.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in img.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    tensor
}

/// Decode an image file and resize it to `width` x `height`
pub fn load_image_tensor(path: &Path, width: u32, height: u32) -> image::ImageResult<Array4<f32>> {
    let img = image::open(path)?;
    let resized = img.resize_exact(width, height, FilterType::Triangle).to_rgb8();
    Ok(rgb_to_tensor(&resized))
}

/// All-zero tensor of the given NCHW shape
pub fn zeros(shape: [usize; 4]) -> Array4<f32> {
    Array4::zeros((shape[0], shape[1], shape[2], shape[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_rgb_to_tensor_layout() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(1, 0, Rgb([255, 0, 51]));

        let tensor = rgb_to_tensor(&img);
        assert_eq!(tensor.shape(), &[1, 3, 1, 2]);
        assert_eq!(tensor[[0, 0, 0, 1]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 1]], 0.0);
        assert!((tensor[[0, 2, 0, 1]] - 0.2).abs() < 1e-6);
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn test_load_image_tensor_resizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.png");
        RgbImage::from_pixel(50, 30, Rgb([10, 20, 30])).save(&path).unwrap();

        let tensor = load_image_tensor(&path, 224, 224).unwrap();
        assert_eq!(tensor.shape(), &DEFAULT_INPUT_SHAPE);
    }
}
