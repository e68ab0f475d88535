//! Frame-to-tensor conversion shared by the palm and landmark models.

use crate::shared::frame::Frame;

/// Axis-aligned source rectangle in frame pixels. May extend past the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn full_frame(frame: &Frame) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: frame.width() as f64,
            height: frame.height() as f64,
        }
    }

    /// Maps a point from `size × size` tensor space back to frame pixels.
    pub fn to_frame(&self, tx: f64, ty: f64, size: u32) -> (f64, f64) {
        (
            self.x + tx / size as f64 * self.width,
            self.y + ty / size as f64 * self.height,
        )
    }
}

/// Sample `crop` into a `size × size` NCHW float32 tensor in `[0, 1]`.
///
/// Nearest-neighbour sampling at pixel centers; samples outside the frame
/// are black.
pub fn crop_to_tensor(frame: &Frame, crop: &CropRect, size: u32) -> ndarray::Array4<f32> {
    let s = size as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (crop.y + (y as f64 + 0.5) * crop.height / s as f64).floor() as i64;
        for x in 0..s {
            let src_x = (crop.x + (x as f64 + 0.5) * crop.width / s as f64).floor() as i64;
            for c in 0..3 {
                if let Some(v) = frame.pixel(src_x, src_y, c) {
                    tensor[[0, c, y, x]] = v as f32 / 255.0;
                }
            }
        }
    }

    tensor
}
