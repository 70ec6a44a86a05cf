//! Random rejection of list-mode events while histogramming them into
//! projection data, e.g. to simulate lower-count acquisitions.
//!
//! Each decision is a pure function of the event (its bin and its position
//! in the event stream), the seed and the threshold: the same session replays
//! the same decisions, whatever order events are processed in.

use rand::{Rng, SeedableRng};
use rand_isaac::Isaac64Rng;
use serde::Deserialize;
use tracing::warn;

use crate::error::{ProjError, Result};
use crate::projdata::Bin;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RandomRejection {
    pub seed: u64,
    /// Events are kept if a uniform random number in `[0, 1)` does not
    /// exceed this value
    pub reject_if_above: f32,
}

impl Default for RandomRejection {
    fn default() -> Self { Self { seed: 42, reject_if_above: 0.5 } }
}

impl RandomRejection {

    pub fn new(seed: u64, reject_if_above: f32) -> Result<Self> {
        let this = Self { seed, reject_if_above };
        this.set_up()?;
        Ok(this)
    }

    pub fn set_up(&self) -> Result<()> {
        if self.seed == 0 {
            return Err(ProjError::Config("random rejection seed needs to be non-zero".into()))
        }
        if !(0.0..=1.0).contains(&self.reject_if_above) {
            return Err(ProjError::Config(format!(
                "reject_if_above needs to be between 0 and 1, got {}", self.reject_if_above
            )))
        }
        Ok(())
    }

    /// Use `seed` in place of the configured one
    pub fn with_seed(self, seed: u64) -> Self {
        if seed != self.seed {
            warn!(configured = self.seed, seed, "random rejection seed overridden");
        }
        Self { seed, ..self }
    }

    pub fn accepts(&self, bin: &Bin, event_index: u64) -> bool {
        let mut rng = Isaac64Rng::seed_from_u64(self.event_seed(bin, event_index));
        rng.gen::<f32>() <= self.reject_if_above
    }

    /// Flag `bin` as rejected, unless the event is accepted
    pub fn apply(&self, bin: &mut Bin, event_index: u64) {
        if !self.accepts(bin, event_index) { bin.reject() }
    }

    fn event_seed(&self, bin: &Bin, event_index: u64) -> u64 {
        let k = bin.key();
        [k.segment_num, k.view_num, k.axial_pos_num, k.tangential_pos_num, k.timing_pos_num, bin.time_frame_num()]
            .into_iter()
            .map(|i| i as u32 as u64)
            .chain(std::iter::once(event_index))
            .fold(self.seed, |h, x| mix(h ^ x))
    }
}

/// SplitMix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
