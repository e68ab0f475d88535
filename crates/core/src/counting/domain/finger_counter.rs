//! Extended-finger counting over 21-point hand landmarks.
//!
//! Each digit is judged by one strict comparison between its tip and a lower
//! joint. Image y grows downward, so "above" means a smaller y. The thumb is
//! judged horizontally: tip to the right of the IP joint for a right hand.

use serde::Serialize;

use crate::detection::domain::hand_landmarks::{
    HandLandmarks, HandObservation, Handedness, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP,
    PINKY_PIP, PINKY_TIP, RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP,
};

/// Counts extended fingers with the fixed right-hand thumb rule.
///
/// Absent landmarks count as zero fingers.
pub fn count_fingers(observation: Option<&HandLandmarks>) -> u8 {
    match observation {
        Some(landmarks) => FingerCounter::default()
            .extended_fingers(landmarks, None)
            .count(),
        None => 0,
    }
}

/// How the thumb's horizontal comparison picks its direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThumbRule {
    /// Always `tip.x > ip.x`, whatever hand is shown.
    #[default]
    FixedRight,
    /// Mirror the comparison for a left hand. Falls back to the right-hand
    /// comparison when handedness is unknown.
    HandednessAware,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExtendedFingers {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl ExtendedFingers {
    pub fn count(&self) -> u8 {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
            .iter()
            .map(|&up| up as u8)
            .sum()
    }
}

/// Classification result that keeps "no hand" apart from a closed fist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FingerOutcome {
    NoHandDetected,
    Count(u8),
}

impl FingerOutcome {
    /// Finger count with "no hand" collapsed to zero.
    pub fn fingers(&self) -> u8 {
        match self {
            FingerOutcome::NoHandDetected => 0,
            FingerOutcome::Count(n) => *n,
        }
    }

    pub fn hand_detected(&self) -> bool {
        matches!(self, FingerOutcome::Count(_))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FingerCounter {
    thumb_rule: ThumbRule,
}

impl FingerCounter {
    pub fn new(thumb_rule: ThumbRule) -> Self {
        Self { thumb_rule }
    }

    pub fn thumb_rule(&self) -> ThumbRule {
        self.thumb_rule
    }

    pub fn classify(&self, observation: Option<&HandObservation>) -> FingerOutcome {
        match observation {
            Some(obs) => FingerOutcome::Count(
                self.extended_fingers(&obs.landmarks, obs.handedness)
                    .count(),
            ),
            None => FingerOutcome::NoHandDetected,
        }
    }

    /// Evaluates all five extension predicates independently.
    pub fn extended_fingers(
        &self,
        landmarks: &HandLandmarks,
        handedness: Option<Handedness>,
    ) -> ExtendedFingers {
        ExtendedFingers {
            thumb: self.thumb_extended(landmarks, handedness),
            index: tip_above_joint(landmarks, INDEX_TIP, INDEX_PIP),
            middle: tip_above_joint(landmarks, MIDDLE_TIP, MIDDLE_PIP),
            ring: tip_above_joint(landmarks, RING_TIP, RING_PIP),
            pinky: tip_above_joint(landmarks, PINKY_TIP, PINKY_PIP),
        }
    }

    fn thumb_extended(&self, landmarks: &HandLandmarks, handedness: Option<Handedness>) -> bool {
        let tip_x = landmarks.point(THUMB_TIP).0;
        let ip_x = landmarks.point(THUMB_IP).0;
        let mirrored = self.thumb_rule == ThumbRule::HandednessAware
            && handedness == Some(Handedness::Left);
        if mirrored {
            tip_x < ip_x
        } else {
            tip_x > ip_x
        }
    }
}

fn tip_above_joint(landmarks: &HandLandmarks, tip: usize, joint: usize) -> bool {
    landmarks.point(tip).1 < landmarks.point(joint).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Every tip sits 30px above its joint and the thumb points right.
    fn open_hand() -> HandLandmarks {
        let mut pts = [(0.0, 0.0); 21];
        pts[INDEX_PIP] = (100.0, 80.0);
        pts[INDEX_TIP] = (100.0, 50.0);
        pts[MIDDLE_PIP] = (120.0, 80.0);
        pts[MIDDLE_TIP] = (120.0, 50.0);
        pts[RING_PIP] = (140.0, 80.0);
        pts[RING_TIP] = (140.0, 50.0);
        pts[PINKY_PIP] = (160.0, 80.0);
        pts[PINKY_TIP] = (160.0, 50.0);
        pts[THUMB_IP] = (50.0, 40.0);
        pts[THUMB_TIP] = (60.0, 40.0);
        HandLandmarks::new(pts)
    }

    /// Every tip sits below its joint and the thumb points left.
    fn fist() -> HandLandmarks {
        let mut pts = [(0.0, 0.0); 21];
        pts[INDEX_PIP] = (100.0, 80.0);
        pts[INDEX_TIP] = (100.0, 95.0);
        pts[MIDDLE_PIP] = (120.0, 80.0);
        pts[MIDDLE_TIP] = (120.0, 95.0);
        pts[RING_PIP] = (140.0, 80.0);
        pts[RING_TIP] = (140.0, 95.0);
        pts[PINKY_PIP] = (160.0, 80.0);
        pts[PINKY_TIP] = (160.0, 95.0);
        pts[THUMB_IP] = (50.0, 40.0);
        pts[THUMB_TIP] = (45.0, 40.0);
        HandLandmarks::new(pts)
    }

    fn with_point(lm: &HandLandmarks, index: usize, p: (f64, f64)) -> HandLandmarks {
        let mut pts = *lm.points();
        pts[index] = p;
        HandLandmarks::new(pts)
    }

    #[test]
    fn test_no_hand_counts_zero() {
        assert_eq!(count_fingers(None), 0);
    }

    #[test]
    fn test_open_hand_counts_five() {
        assert_eq!(count_fingers(Some(&open_hand())), 5);
    }

    #[test]
    fn test_fist_counts_zero() {
        assert_eq!(count_fingers(Some(&fist())), 0);
    }

    #[test]
    fn test_reference_scenario_counts_two() {
        let mut pts = [(0.0, 0.0); 21];
        pts[8] = (100.0, 50.0);
        pts[6] = (100.0, 80.0);
        pts[12] = (120.0, 90.0);
        pts[10] = (120.0, 60.0);
        pts[16] = (140.0, 100.0);
        pts[14] = (140.0, 70.0);
        pts[20] = (160.0, 110.0);
        pts[18] = (160.0, 75.0);
        pts[4] = (60.0, 40.0);
        pts[3] = (50.0, 40.0);
        let lm = HandLandmarks::new(pts);

        let fingers = FingerCounter::default().extended_fingers(&lm, None);
        assert!(fingers.index);
        assert!(!fingers.middle);
        assert!(!fingers.ring);
        assert!(!fingers.pinky);
        assert!(fingers.thumb);
        assert_eq!(count_fingers(Some(&lm)), 2);
    }

    // Curling one digit of an open hand drops exactly one finger.
    #[rstest]
    #[case::thumb(THUMB_TIP, (40.0, 40.0))]
    #[case::index(INDEX_TIP, (100.0, 90.0))]
    #[case::middle(MIDDLE_TIP, (120.0, 90.0))]
    #[case::ring(RING_TIP, (140.0, 90.0))]
    #[case::pinky(PINKY_TIP, (160.0, 90.0))]
    fn test_curling_one_finger_removes_one(#[case] tip: usize, #[case] curled: (f64, f64)) {
        let lm = with_point(&open_hand(), tip, curled);
        assert_eq!(count_fingers(Some(&lm)), 4);
    }

    // Raising one digit of a fist adds exactly one finger.
    #[rstest]
    #[case::thumb(THUMB_TIP, (55.0, 40.0))]
    #[case::index(INDEX_TIP, (100.0, 60.0))]
    #[case::middle(MIDDLE_TIP, (120.0, 60.0))]
    #[case::ring(RING_TIP, (140.0, 60.0))]
    #[case::pinky(PINKY_TIP, (160.0, 60.0))]
    fn test_raising_one_finger_adds_one(#[case] tip: usize, #[case] raised: (f64, f64)) {
        let lm = with_point(&fist(), tip, raised);
        assert_eq!(count_fingers(Some(&lm)), 1);
    }

    #[rstest]
    #[case::index(INDEX_TIP, INDEX_PIP)]
    #[case::middle(MIDDLE_TIP, MIDDLE_PIP)]
    #[case::ring(RING_TIP, RING_PIP)]
    #[case::pinky(PINKY_TIP, PINKY_PIP)]
    fn test_tip_level_with_joint_is_not_extended(#[case] tip: usize, #[case] joint: usize) {
        let level = open_hand().point(joint);
        let lm = with_point(&open_hand(), tip, level);
        assert_eq!(count_fingers(Some(&lm)), 4);
    }

    #[test]
    fn test_thumb_level_with_joint_is_not_extended() {
        let lm = with_point(&open_hand(), THUMB_TIP, (50.0, 10.0));
        assert_eq!(count_fingers(Some(&lm)), 4);
    }

    #[test]
    fn test_counting_is_repeatable() {
        let lm = open_hand();
        let first = count_fingers(Some(&lm));
        let second = count_fingers(Some(&lm));
        assert_eq!(first, second);
    }

    #[test]
    fn test_only_reference_joints_matter() {
        // Moving wrist and MCP/DIP joints around changes nothing.
        let mut lm = open_hand();
        for idx in [0, 1, 2, 5, 7, 9, 11, 13, 15, 17, 19] {
            lm = with_point(&lm, idx, (999.0, -999.0));
        }
        assert_eq!(count_fingers(Some(&lm)), 5);
    }

    // ── classify ────────────────────────────────────────────────────

    #[test]
    fn test_classify_without_hand() {
        let outcome = FingerCounter::default().classify(None);
        assert_eq!(outcome, FingerOutcome::NoHandDetected);
        assert_eq!(outcome.fingers(), 0);
        assert!(!outcome.hand_detected());
    }

    #[test]
    fn test_classify_fist_is_distinct_from_no_hand() {
        let obs = HandObservation::new(fist());
        let outcome = FingerCounter::default().classify(Some(&obs));
        assert_eq!(outcome, FingerOutcome::Count(0));
        assert!(outcome.hand_detected());
        assert_ne!(outcome, FingerOutcome::NoHandDetected);
    }

    #[test]
    fn test_classify_matches_count_fingers_for_fixed_rule() {
        let obs = HandObservation::new(open_hand()).with_handedness(Handedness::Left);
        let outcome = FingerCounter::new(ThumbRule::FixedRight).classify(Some(&obs));
        assert_eq!(outcome.fingers(), count_fingers(Some(&obs.landmarks)));
    }

    // ── thumb rule ──────────────────────────────────────────────────

    #[rstest]
    #[case::fixed_left(ThumbRule::FixedRight, Some(Handedness::Left), true)]
    #[case::fixed_right(ThumbRule::FixedRight, Some(Handedness::Right), true)]
    #[case::aware_left(ThumbRule::HandednessAware, Some(Handedness::Left), false)]
    #[case::aware_right(ThumbRule::HandednessAware, Some(Handedness::Right), true)]
    #[case::aware_unknown(ThumbRule::HandednessAware, None, true)]
    fn test_thumb_rule_for_tip_right_of_joint(
        #[case] rule: ThumbRule,
        #[case] handedness: Option<Handedness>,
        #[case] expected: bool,
    ) {
        let fingers = FingerCounter::new(rule).extended_fingers(&open_hand(), handedness);
        assert_eq!(fingers.thumb, expected);
    }

    #[test]
    fn test_handedness_aware_mirrors_only_thumb() {
        let counter = FingerCounter::new(ThumbRule::HandednessAware);
        let right = counter.extended_fingers(&fist(), Some(Handedness::Right));
        let left = counter.extended_fingers(&fist(), Some(Handedness::Left));
        assert!(!right.thumb);
        assert!(left.thumb);
        assert_eq!(
            (right.index, right.middle, right.ring, right.pinky),
            (left.index, left.middle, left.ring, left.pinky)
        );
    }

    #[test]
    fn test_extended_fingers_count() {
        let fingers = ExtendedFingers {
            thumb: true,
            index: false,
            middle: true,
            ring: false,
            pinky: true,
        };
        assert_eq!(fingers.count(), 3);
        assert_eq!(ExtendedFingers::default().count(), 0);
    }
}
