/// Palm detector (BlazePalm) using ONNX Runtime via `ort`.
///
/// Produces axis-aligned palm boxes that seed the hand landmark crop.
use std::path::Path;

use super::execution_provider::{load_session, square_input_size};
use super::math::{bbox_iou, sigmoid};
use super::preprocess::{crop_to_tensor, CropRect};
use crate::shared::frame::Frame;

/// Fallback palm model input resolution.
const DEFAULT_INPUT_SIZE: u32 = 192;

/// Default palm confidence threshold.
pub const DEFAULT_PALM_CONFIDENCE: f64 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Values per anchor in the regressor output: box (4) + 7 keypoints (14).
const REGRESSOR_STRIDE: usize = 18;

/// Crop side relative to the larger palm box side.
const HAND_CROP_SCALE: f64 = 2.6;

/// Upward crop shift relative to palm box height; fingers extend above the palm.
const HAND_CROP_SHIFT_Y: f64 = -0.5;

/// Palm box in frame pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct PalmBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub score: f64,
}

impl PalmBox {
    fn bbox(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Square region expected to contain the whole hand.
    pub fn hand_crop(&self) -> CropRect {
        let w = self.x2 - self.x1;
        let h = self.y2 - self.y1;
        let cx = (self.x1 + self.x2) / 2.0;
        let cy = (self.y1 + self.y2) / 2.0 + HAND_CROP_SHIFT_Y * h;
        let side = w.max(h) * HAND_CROP_SCALE;
        CropRect {
            x: cx - side / 2.0,
            y: cy - side / 2.0,
            width: side,
            height: side,
        }
    }
}

/// BlazePalm detector backed by an ONNX Runtime session.
pub struct OnnxPalmDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
    anchors: Vec<[f32; 2]>,
}

impl OnnxPalmDetector {
    /// Load a palm detection ONNX model.
    ///
    /// The input resolution is read from the model's NCHW input shape,
    /// falling back to 192.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input_size = square_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        let anchors = generate_anchors(input_size);
        Ok(Self {
            session,
            confidence,
            input_size,
            anchors,
        })
    }

    /// Palm boxes sorted by descending score.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmBox>, Box<dyn std::error::Error>> {
        let input_tensor = crop_to_tensor(frame, &CropRect::full_frame(frame), self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Two tensors: regressors [1, N, 18] and scores [1, N, 1], in either order.
        if outputs.len() < 2 {
            return Err(format!("Palm model expected 2 outputs, got {}", outputs.len()).into());
        }
        let first = outputs[0].try_extract_array::<f32>()?;
        let second = outputs[1].try_extract_array::<f32>()?;
        let (regressors, scores) = if first.shape().last() == Some(&1) {
            (second, first)
        } else {
            (first, second)
        };
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let mut raw = decode_palms(
            reg_data,
            score_data,
            &self.anchors,
            self.input_size,
            (frame.width(), frame.height()),
            self.confidence,
        );
        let palms = nms(&mut raw, NMS_IOU_THRESH);
        log::debug!("Palm detector kept {} of {} candidates", palms.len(), raw.len());
        Ok(palms)
    }
}

// ---------------------------------------------------------------------------
// Anchors
// ---------------------------------------------------------------------------

/// Generate BlazePalm anchor centers in normalized coordinates.
///
/// Stride 8 carries 2 anchors per cell; the three stride-16 layers share one
/// grid and contribute 6 anchors per cell. At 192px that is 2016 anchors.
fn generate_anchors(input_size: u32) -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::new();

    for &(stride, num) in &strides {
        let grid_size = input_size as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn decode_palms(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    input_size: u32,
    (fw, fh): (u32, u32),
    confidence: f64,
) -> Vec<PalmBox> {
    let size = input_size as f32;
    let mut palms = Vec::new();

    for (i, &raw_score) in score_data.iter().enumerate().take(anchors.len()) {
        let score = sigmoid(raw_score);
        if (score as f64) < confidence {
            continue;
        }
        let offset = i * REGRESSOR_STRIDE;
        if offset + 4 > reg_data.len() {
            break;
        }

        let anchor = &anchors[i];
        let cx = anchor[0] + reg_data[offset] / size;
        let cy = anchor[1] + reg_data[offset + 1] / size;
        let w = reg_data[offset + 2] / size;
        let h = reg_data[offset + 3] / size;

        palms.push(PalmBox {
            x1: ((cx - w / 2.0) * fw as f32) as f64,
            y1: ((cy - h / 2.0) * fh as f32) as f64,
            x2: ((cx + w / 2.0) * fw as f32) as f64,
            y2: ((cy + h / 2.0) * fh as f32) as f64,
            score: score as f64,
        });
    }

    palms
}

fn nms(dets: &mut [PalmBox], iou_thresh: f64) -> Vec<PalmBox> {
    dets.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && bbox_iou(&dets[i].bbox(), &dets[j].bbox()) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn palm(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> PalmBox {
        PalmBox {
            x1,
            y1,
            x2,
            y2,
            score,
        }
    }

    #[test]
    fn test_generate_anchors_count() {
        // 24×24 grid × 2 anchors + 12×12 grid × 6 anchors = 1152 + 864
        assert_eq!(generate_anchors(192).len(), 2016);
    }

    #[test]
    fn test_anchors_in_unit_range() {
        for a in generate_anchors(192) {
            assert!(a[0] > 0.0 && a[0] < 1.0);
            assert!(a[1] > 0.0 && a[1] < 1.0);
        }
    }

    #[test]
    fn test_decode_skips_low_scores() {
        let anchors = vec![[0.5, 0.5]; 2];
        let reg = vec![0.0; 2 * REGRESSOR_STRIDE];
        let scores = [-5.0, -3.0];
        let palms = decode_palms(&reg, &scores, &anchors, 192, (640, 480), 0.5);
        assert!(palms.is_empty());
    }

    #[test]
    fn test_decode_box_relative_to_anchor() {
        let anchors = vec![[0.5, 0.5]];
        let mut reg = vec![0.0; REGRESSOR_STRIDE];
        reg[0] = 19.2; // +0.1 in normalized x
        reg[2] = 96.0; // width 0.5
        reg[3] = 48.0; // height 0.25
        let palms = decode_palms(&reg, &[4.0], &anchors, 192, (100, 200), 0.5);
        assert_eq!(palms.len(), 1);
        let p = &palms[0];
        // cx = 0.6, w = 0.5 → x in [0.35, 0.85] × 100
        assert_relative_eq!(p.x1, 35.0, epsilon = 1e-3);
        assert_relative_eq!(p.x2, 85.0, epsilon = 1e-3);
        // cy = 0.5, h = 0.25 → y in [0.375, 0.625] × 200
        assert_relative_eq!(p.y1, 75.0, epsilon = 1e-3);
        assert_relative_eq!(p.y2, 125.0, epsilon = 1e-3);
        assert!(p.score > 0.98);
    }

    #[test]
    fn test_decode_stops_at_truncated_regressors() {
        let anchors = vec![[0.5, 0.5]; 2];
        let reg = vec![0.0; REGRESSOR_STRIDE]; // only one anchor's worth
        let palms = decode_palms(&reg, &[4.0, 4.0], &anchors, 192, (100, 100), 0.5);
        assert_eq!(palms.len(), 1);
    }

    #[test]
    fn test_nms_suppresses_overlap_and_orders_by_score() {
        let mut dets = vec![
            palm(5.0, 5.0, 105.0, 105.0, 0.7),
            palm(0.0, 0.0, 100.0, 100.0, 0.9),
            palm(300.0, 300.0, 350.0, 350.0, 0.8),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 2);
        assert_relative_eq!(kept[0].score, 0.9);
        assert_relative_eq!(kept[1].score, 0.8);
    }

    #[test]
    fn test_hand_crop_is_square_scaled_and_shifted_up() {
        let crop = palm(100.0, 200.0, 140.0, 220.0, 0.9).hand_crop();
        // side = max(40, 20) * 2.6
        assert_relative_eq!(crop.width, 104.0, epsilon = 1e-9);
        assert_relative_eq!(crop.height, 104.0, epsilon = 1e-9);
        // center = (120, 210 - 10)
        assert_relative_eq!(crop.x + crop.width / 2.0, 120.0, epsilon = 1e-9);
        assert_relative_eq!(crop.y + crop.height / 2.0, 200.0, epsilon = 1e-9);
    }
}
