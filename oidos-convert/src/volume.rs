//! Stereo gain pairs

use core::ops::{Mul, MulAssign};

/// Stereo gain `(left, right)`
///
/// Gains compose component-wise. A volume is panned when its channels
/// differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    pub left: f64,
    pub right: f64,
}

impl Volume {
    pub const UNITY: Volume = Volume {
        left: 1.0,
        right: 1.0,
    };

    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// Equal gain on both channels
    pub fn gain(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Equal-power panning from a `0..1` pan position (0.5 is center)
    pub fn panning(pan: f64) -> Self {
        Self::new((2.0 * (1.0 - pan)).sqrt(), (2.0 * pan).sqrt())
    }

    pub fn is_panned(&self) -> bool {
        self.left != self.right
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::UNITY
    }
}

impl Mul for Volume {
    type Output = Volume;

    fn mul(self, other: Volume) -> Volume {
        Volume::new(self.left * other.left, self.right * other.right)
    }
}

impl MulAssign for Volume {
    fn mul_assign(&mut self, other: Volume) {
        *self = *self * other;
    }
}
