pub mod hand_landmark_detector;
pub mod hand_landmarks;
