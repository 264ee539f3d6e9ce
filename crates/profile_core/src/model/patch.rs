//! Partial-update helpers shared by every `*Patch` payload.
//!
//! A patch field is `None` when the client omitted it. Optional entity fields
//! use [`Nullable`], so an explicit JSON `null` becomes `Some(None)` and
//! clears the stored value.

use serde::{Deserialize, Deserializer};

/// Patch slot for an optional field: absent, cleared, or set.
pub type Nullable<T> = Option<Option<T>>;

/// Deserializes a present field (including `null`) as `Some(..)`.
///
/// Pair with `#[serde(default)]` so an absent field stays `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Nullable<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Flattens a patch slot to the value it would leave behind, if it sets one.
pub fn assigned<T>(slot: &Nullable<T>) -> Option<&T> {
    slot.as_ref().and_then(Option::as_ref)
}
