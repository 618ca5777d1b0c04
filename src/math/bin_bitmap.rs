use crate::error::{Error, StateError};
use crate::math::bit_math::{closest_bit, least_significant_bit, most_significant_bit, Direction};
use crate::{FastMap, MAX_BIN_ID};
use alloy_primitives::U256;
use tracing::trace;

/// Computes the leaf word key and bit position for a bin id.
///
/// Leaf word `id >> 8` holds 256 consecutive bins; its own bit in the
/// branch level is `position(id >> 8)`, and so on up to the root.
#[inline]
pub fn position(id: u32) -> (u32, u8) {
    (id >> 8, (id & 0xff) as u8)
}

/// Returns the bitmap word stored at `key`, or zero if absent.
#[inline]
pub fn get_word(level: &FastMap<u32, U256>, key: u32) -> U256 {
    level.get(&key).copied().unwrap_or(U256::ZERO)
}

/// Bit of `word` that is closest to a search arriving from `direction`'s
/// opposite side: the highest bit when walking down, the lowest when
/// walking up.
fn extreme_bit(word: U256, direction: Direction) -> Result<u8, Error> {
    Ok(match direction {
        Direction::Lower => most_significant_bit(word)?,
        Direction::Higher => least_significant_bit(word)?,
    })
}

fn check_id(id: u32) -> Result<(), StateError> {
    if id > MAX_BIN_ID {
        return Err(StateError::BinIdOutOfBounds);
    }
    Ok(())
}

/// Three‑level bitmap over the 24‑bit bin id space.
///
/// A leaf bit is set iff its bin holds liquidity; a branch bit iff its
/// leaf word is non‑zero; a root bit iff its branch word is non‑zero.
/// Branch and leaf words live in sparse maps and zero words are dropped,
/// so an empty region of the id space costs nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BinBitmap {
    root: U256,
    branches: FastMap<u32, U256>,
    leaves: FastMap<u32, U256>,
}

impl BinBitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when no bin is marked.
    pub fn is_empty(&self) -> bool {
        self.root.is_zero()
    }

    /// Returns whether bin `id` is marked as holding liquidity.
    pub fn contains(&self, id: u32) -> bool {
        if id > MAX_BIN_ID {
            return false;
        }
        let (leaf_key, leaf_bit) = position(id);
        get_word(&self.leaves, leaf_key).bit(leaf_bit as usize)
    }

    /// Marks bin `id` as non‑empty.
    ///
    /// The branch and root bits are set unconditionally, which is a no‑op
    /// when they already are. Returns whether the leaf bit was newly set.
    pub fn insert(&mut self, id: u32) -> Result<bool, StateError> {
        check_id(id)?;

        let (leaf_key, leaf_bit) = position(id);
        let (branch_key, branch_bit) = position(leaf_key);

        let leaf = self.leaves.entry(leaf_key).or_insert(U256::ZERO);
        if leaf.bit(leaf_bit as usize) {
            return Ok(false);
        }
        *leaf |= U256::ONE << leaf_bit as usize;

        *self.branches.entry(branch_key).or_insert(U256::ZERO) |= U256::ONE << branch_bit as usize;
        self.root |= U256::ONE << branch_key as usize;

        trace!(id, leaf_key, branch_key, "bin marked non-empty");
        Ok(true)
    }

    /// Clears bin `id`.
    ///
    /// The branch bit is cleared only when the leaf word becomes zero, and
    /// the root bit only when the branch word does. Returns whether the leaf
    /// bit was set.
    pub fn remove(&mut self, id: u32) -> Result<bool, StateError> {
        check_id(id)?;

        let (leaf_key, leaf_bit) = position(id);
        let (branch_key, branch_bit) = position(leaf_key);

        let leaf = get_word(&self.leaves, leaf_key);
        if !leaf.bit(leaf_bit as usize) {
            return Ok(false);
        }

        let leaf = leaf & !(U256::ONE << leaf_bit as usize);
        if !leaf.is_zero() {
            self.leaves.insert(leaf_key, leaf);
        } else {
            self.leaves.remove(&leaf_key);

            let branch = get_word(&self.branches, branch_key) & !(U256::ONE << branch_bit as usize);
            if !branch.is_zero() {
                self.branches.insert(branch_key, branch);
            } else {
                self.branches.remove(&branch_key);
                self.root &= !(U256::ONE << branch_key as usize);
            }
        }

        trace!(id, leaf_key, branch_key, "bin cleared");
        Ok(true)
    }

    /// Finds the marked bin closest to `id` in `direction`, excluding `id`.
    ///
    /// Looks in the leaf word of `id` first, then the rest of its branch,
    /// then the root; once a level answers, the levels below are read at
    /// their extreme bit, since anything in a farther word is farther than
    /// the start. At most three directed scans plus two extreme‑bit reads,
    /// whatever the sparsity.
    pub fn find_nearest(&self, id: u32, direction: Direction) -> Result<Option<u32>, Error> {
        check_id(id)?;

        let (leaf_key, leaf_bit) = position(id);
        if let Some(bit) = closest_bit(get_word(&self.leaves, leaf_key), leaf_bit, direction) {
            return Ok(Some(leaf_key << 8 | bit as u32));
        }

        let (branch_key, branch_bit) = position(leaf_key);
        if let Some(bit) = closest_bit(get_word(&self.branches, branch_key), branch_bit, direction)
        {
            let leaf_key = branch_key << 8 | bit as u32;
            let bit = extreme_bit(get_word(&self.leaves, leaf_key), direction)?;
            return Ok(Some(leaf_key << 8 | bit as u32));
        }

        if let Some(bit) = closest_bit(self.root, branch_key as u8, direction) {
            let branch_key = bit as u32;
            let leaf_key =
                branch_key << 8 | extreme_bit(get_word(&self.branches, branch_key), direction)? as u32;
            let bit = extreme_bit(get_word(&self.leaves, leaf_key), direction)?;
            return Ok(Some(leaf_key << 8 | bit as u32));
        }

        Ok(None)
    }
}
