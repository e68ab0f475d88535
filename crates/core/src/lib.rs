//! Hand landmark detection and extended-finger counting.
//!
//! Layout mirrors the service flow: `imaging` turns payloads into frames,
//! `detection` finds a hand's 21 landmarks, `counting` classifies them and
//! `pipeline` wires the three together.

pub mod counting;
pub mod detection;
pub mod imaging;
pub mod pipeline;
pub mod shared;

pub use counting::domain::finger_counter::count_fingers;
