//! Ring buffer of time‑weighted samples of the active bin.
//!
//! Each sample carries three cumulatives (active id, volatility accumulator
//! and bins crossed), every one growing by `value * elapsed_seconds`. A
//! sample keeps absorbing updates until it is `sample_lifetime` seconds old;
//! the next update then moves on to the following slot. The difference of
//! two cumulatives divided by the time between them is the time‑weighted
//! mean of that value.
//!
//! The ring does not know which slot is the newest: the pair passes the
//! active index in and stores the one handed back.

use crate::error::{Error, MathError, OracleError};
use tracing::debug;

/// One oracle observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sample {
    /// When this slot was (re)opened.
    pub created_at: u64,
    /// Time of the last update folded in.
    pub timestamp: u64,
    pub cumulative_id: u64,
    pub cumulative_volatility: u64,
    pub cumulative_bins_crossed: u64,
}

/// Cumulatives read back from the oracle at some point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cumulatives {
    pub id: u64,
    pub volatility: u64,
    pub bins_crossed: u64,
}

impl Sample {
    fn opened(timestamp: u64) -> Self {
        Self {
            created_at: timestamp,
            timestamp,
            ..Default::default()
        }
    }

    /// Returns this sample advanced to `timestamp`, each cumulative grown by
    /// its current value times the elapsed seconds.
    pub fn accumulate(
        &self,
        timestamp: u64,
        active_id: u32,
        volatility: u32,
        bins_crossed: u32,
    ) -> Result<Sample, MathError> {
        let elapsed = timestamp
            .checked_sub(self.timestamp)
            .ok_or(MathError::Underflow)?;

        let grow = |cumulative: u64, value: u32| {
            (value as u64)
                .checked_mul(elapsed)
                .and_then(|delta| cumulative.checked_add(delta))
                .ok_or(MathError::Overflow)
        };

        Ok(Sample {
            created_at: self.created_at,
            timestamp,
            cumulative_id: grow(self.cumulative_id, active_id)?,
            cumulative_volatility: grow(self.cumulative_volatility, volatility)?,
            cumulative_bins_crossed: grow(self.cumulative_bins_crossed, bins_crossed)?,
        })
    }

    #[inline]
    pub fn cumulatives(&self) -> Cumulatives {
        Cumulatives {
            id: self.cumulative_id,
            volatility: self.cumulative_volatility,
            bins_crossed: self.cumulative_bins_crossed,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Oracle {
    samples: Vec<Option<Sample>>,
}

impl Oracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated slots.
    #[inline]
    pub fn len(&self) -> u16 {
        self.samples.len() as u16
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample(&self, index: u16) -> Option<Sample> {
        self.samples.get(index as usize).copied().flatten()
    }

    /// Allocates slot `index` (and any slot before it). Allocated slots
    /// hold no sample until an update writes one.
    ///
    /// The ring holds at most `u16::MAX` slots, so `index` must be below
    /// `u16::MAX`.
    pub fn initialize(&mut self, index: u16) -> Result<(), OracleError> {
        if index == u16::MAX {
            return Err(OracleError::InvalidLength);
        }
        if index as usize >= self.samples.len() {
            self.samples.resize(index as usize + 1, None);
        }
        Ok(())
    }

    /// Grows the ring to `new_length` slots and returns the index of the
    /// newest sample afterwards.
    ///
    /// A ring that already wrapped is rotated so that its oldest sample sits
    /// in slot 0; the new empty slots then follow the newest sample and are
    /// filled before anything gets overwritten.
    pub fn increase_length(
        &mut self,
        active_index: u16,
        new_length: u16,
    ) -> Result<u16, OracleError> {
        let size = self.len();
        if new_length <= size {
            return Err(OracleError::InvalidLength);
        }

        let mut active_index = active_index;
        if size > 0 {
            if active_index >= size {
                return Err(OracleError::InvalidLength);
            }
            let oldest = (active_index + 1) % size;
            if oldest != 0 && self.samples[oldest as usize].is_some() {
                self.samples.rotate_left(oldest as usize);
                active_index = size - 1;
            }
        }

        self.initialize(new_length - 1)?;
        debug!(from = size, to = new_length, "oracle length increased");
        Ok(active_index)
    }

    /// Computes the write an update would perform without performing it:
    /// the index the newest sample ends up at and, if anything changes, the
    /// sample to store there.
    pub fn prepare_update(
        &self,
        size: u16,
        sample_lifetime: u64,
        last_index: u16,
        timestamp: u64,
        active_id: u32,
        volatility: u32,
        bins_crossed: u32,
    ) -> Result<(u16, Option<Sample>), Error> {
        if size == 0 || size > self.len() || last_index >= size {
            return Err(OracleError::InvalidLength.into());
        }

        let Some(last) = self.sample(last_index) else {
            return Ok((last_index, Some(Sample::opened(timestamp))));
        };

        if timestamp <= last.timestamp {
            return Ok((last_index, None));
        }

        let folded = last.accumulate(timestamp, active_id, volatility, bins_crossed)?;

        if timestamp - last.created_at >= sample_lifetime {
            let next = (last_index + 1) % size;
            Ok((
                next,
                Some(Sample {
                    created_at: timestamp,
                    ..folded
                }),
            ))
        } else {
            Ok((last_index, Some(folded)))
        }
    }

    /// Folds one update into the sample at `last_index` and returns the
    /// index of the newest sample.
    pub fn update(
        &mut self,
        size: u16,
        sample_lifetime: u64,
        last_index: u16,
        timestamp: u64,
        active_id: u32,
        volatility: u32,
        bins_crossed: u32,
    ) -> Result<u16, Error> {
        let (index, sample) = self.prepare_update(
            size,
            sample_lifetime,
            last_index,
            timestamp,
            active_id,
            volatility,
            bins_crossed,
        )?;
        if let Some(sample) = sample {
            self.write(index, sample);
            if index != last_index {
                debug!(from = last_index, to = index, timestamp, "oracle advanced to next sample");
            }
        }
        Ok(index)
    }

    pub(crate) fn write(&mut self, index: u16, sample: Sample) {
        self.samples[index as usize] = Some(sample);
    }

    /// Cumulatives at `lookup`.
    ///
    /// Between two samples each field is interpolated linearly; at or after
    /// the newest sample the newest sample itself is returned.
    pub fn sample_at(
        &self,
        size: u16,
        active_index: u16,
        lookup: u64,
    ) -> Result<Cumulatives, OracleError> {
        if size == 0 || size > self.len() || active_index >= size {
            return Err(OracleError::NotInitialized);
        }
        let newest = self
            .sample(active_index)
            .ok_or(OracleError::NotInitialized)?;

        // Until the ring wraps the slot after the newest sample is still
        // empty and the oldest sample is slot 0.
        let after = (active_index + 1) % size;
        let (start, length) = match self.sample(after) {
            Some(_) => (after, size),
            None => (0, active_index + 1),
        };
        let logical = |i: u16| {
            let index = (start as u32 + i as u32) % size as u32;
            self.sample(index as u16)
                .ok_or(OracleError::NotInitialized)
        };

        let oldest = logical(0)?;
        if lookup < oldest.timestamp {
            return Err(OracleError::TooOld);
        }
        if lookup >= newest.timestamp {
            return Ok(newest.cumulatives());
        }

        // oldest.timestamp <= lookup < newest.timestamp
        let (mut low, mut high) = (0u16, length - 1);
        while high - low > 1 {
            let mid = low + (high - low) / 2;
            if logical(mid)?.timestamp <= lookup {
                low = mid;
            } else {
                high = mid;
            }
        }

        let prev = logical(low)?;
        let next = logical(high)?;
        if prev.timestamp == lookup {
            return Ok(prev.cumulatives());
        }

        let weight_prev = (next.timestamp - lookup) as u128;
        let weight_next = (lookup - prev.timestamp) as u128;
        let total = weight_prev + weight_next;
        let mix = |a: u64, b: u64| ((a as u128 * weight_prev + b as u128 * weight_next) / total) as u64;

        Ok(Cumulatives {
            id: mix(prev.cumulative_id, next.cumulative_id),
            volatility: mix(prev.cumulative_volatility, next.cumulative_volatility),
            bins_crossed: mix(prev.cumulative_bins_crossed, next.cumulative_bins_crossed),
        })
    }
}
