//! Three-wheel encoder simulator.
//!
//! Inverts the tracking-wheel kinematics: a body motion of `forward`,
//! `right` and clockwise `dh` turns each wheel by
//!
//! ```text
//! left   = forward + dh·side/2
//! right  = forward − dh·side/2
//! middle = right − dh·middle_offset
//! ```
//!
//! Fractional ticks are carried between steps so slow motion still counts.

use super::noise::NoiseGenerator;
use crate::sensors::{EncoderTicks, ThreeWheelGeometry};

/// Encoder simulator for a three-wheel odometry rig
pub struct EncoderSimulator {
    geometry: ThreeWheelGeometry,
    ticks_per_unit: f64,
    slip_stddev: f64,
    noise: NoiseGenerator,
    /// Fractional ticks carried to the next step
    accumulator: [f64; 3],
    /// Tick counts as the wheels see them (before polarity)
    ticks: EncoderTicks,
}

impl EncoderSimulator {
    pub fn new(geometry: ThreeWheelGeometry, slip_stddev: f64, noise: NoiseGenerator) -> Self {
        Self {
            ticks_per_unit: 1.0 / geometry.inches_per_tick(),
            geometry,
            slip_stddev,
            noise,
            accumulator: [0.0; 3],
            ticks: EncoderTicks::default(),
        }
    }

    /// Turn the wheels for one body motion step.
    pub fn update(&mut self, forward: f64, right: f64, dh: f64) {
        let half_side = self.geometry.side_encoder_distance / 2.0;
        let travel = [
            forward + dh * half_side,
            forward - dh * half_side,
            right - dh * self.geometry.middle_encoder_offset,
        ];

        let mut whole = [0i32; 3];
        for (i, distance) in travel.iter().enumerate() {
            let slip = self.noise.slip(self.slip_stddev);
            self.accumulator[i] += distance * self.ticks_per_unit * slip;
            let ticks = self.accumulator[i].trunc();
            self.accumulator[i] -= ticks;
            whole[i] = ticks as i32;
        }

        self.ticks.left = self.ticks.left.wrapping_add(whole[0]);
        self.ticks.right = self.ticks.right.wrapping_add(whole[1]);
        self.ticks.middle = self.ticks.middle.wrapping_add(whole[2]);
    }

    /// Counts as read from the hardware, with mounting polarity applied.
    pub fn raw_ticks(&self) -> EncoderTicks {
        // Polarity is its own inverse
        self.geometry.apply_polarity(self.ticks)
    }
}
