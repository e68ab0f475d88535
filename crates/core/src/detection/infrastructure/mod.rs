pub mod execution_provider;
pub mod math;
pub mod model_resolver;
pub mod onnx_hand_landmark_detector;
pub mod onnx_palm_detector;
pub mod preprocess;
