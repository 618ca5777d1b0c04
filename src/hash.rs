//! Hash map used for every sparse, id-keyed table in the crate: bitmap
//! words of the bin index, in-memory bin storage and staged swap writes.
//!
//! Keys are small integers, so a non-cryptographic hasher is selected by
//! cargo feature. `rustc-hash` alone picks `FxHashMap` and `ahash` alone
//! picks `AHashMap`. Any other combination (`std-hash` set, both `rustc-hash`
//! and `ahash` set, or none of the three) uses `std::collections::HashMap`.

#[cfg(all(
    feature = "rustc-hash",
    not(any(feature = "ahash", feature = "std-hash"))
))]
pub type FastMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(all(
    feature = "ahash",
    not(any(feature = "rustc-hash", feature = "std-hash"))
))]
pub type FastMap<K, V> = ahash::AHashMap<K, V>;

#[cfg(any(
    feature = "std-hash",
    all(feature = "rustc-hash", feature = "ahash"),
    not(any(feature = "rustc-hash", feature = "ahash")),
))]
pub type FastMap<K, V> = std::collections::HashMap<K, V>;
