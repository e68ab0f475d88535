pub const PALM_MODEL_NAME: &str = "palm_detection_full.onnx";
pub const HAND_LANDMARK_MODEL_NAME: &str = "hand_landmark_full.onnx";

/// Number of landmarks per detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Default directory for transient request images.
pub const DEFAULT_UPLOAD_DIR: &str = "static/upload";

/// Default maximum accepted image payload (16 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 16 * 1024 * 1024;
