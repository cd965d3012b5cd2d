//! Coefficient of performance with threshold gating and exponential smoothing.

use crate::quantity::power::Watts;

/// Exponentially smoothed COP, carried across poll cycles.
#[derive(Clone, Debug, Default)]
pub struct CopSmoother {
    last: Option<f64>,
}

impl CopSmoother {
    /// Below this electrical input the ratio is too noisy.
    pub const MIN_POWER_IN: Watts = Watts(2000.0);

    /// Below this heat output the compressor is likely ramping.
    pub const MIN_POWER_OUT: Watts = Watts(3000.0);

    pub const MAX_REALISTIC: f64 = 8.0;

    /// Weight of the new sample.
    pub const ALPHA: f64 = 0.3;

    pub const fn last(&self) -> Option<f64> {
        self.last
    }

    pub const fn reset(&mut self) {
        self.last = None;
    }

    /// Feed the instantaneous powers and return the current smoothed value.
    ///
    /// The previous value is carried forward when either power is missing or below its threshold.
    pub fn update(&mut self, power_in: Option<Watts>, power_out: Option<Watts>) -> Option<f64> {
        let (Some(power_in), Some(power_out)) = (power_in, power_out) else {
            return self.last;
        };
        if power_in < Self::MIN_POWER_IN || power_out < Self::MIN_POWER_OUT {
            return self.last;
        }
        let raw = (power_out.0 / power_in.0).min(Self::MAX_REALISTIC);
        let smoothed =
            self.last.map_or(raw, |last| Self::ALPHA.mul_add(raw, (1.0 - Self::ALPHA) * last));
        let rounded = (smoothed * 100.0).round() / 100.0;
        self.last = Some(rounded);
        self.last
    }
}
