use crate::{
    db::{data::DataKey, identity::RecordId},
    error::InternalError,
    serialize::{deserialize, serialize},
};
use canic_cdk::structures::{Storable, storable::Bound};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Max serialized bytes for one ledger entry.
pub(crate) const MAX_LEDGER_ENTRY_BYTES: u32 = 256;

///
/// LedgerEntry
///
/// Passive record of one host's disambiguator. Carries its own target so a
/// decoded entry can be checked against the key it was stored under.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub target_type: String,
    pub target_id: RecordId,
    pub index: u32,
    pub created_at: u64,
    pub updated_at: u64,
}

impl LedgerEntry {
    #[must_use]
    pub(crate) fn new(key: DataKey, index: u32, now: u64) -> Self {
        Self {
            target_type: key.entity().as_str().to_string(),
            target_id: key.id(),
            index,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this entry belongs to the host addressed by `key`.
    #[must_use]
    pub fn targets(&self, key: &DataKey) -> bool {
        self.target_id == key.id() && self.target_type == key.entity().as_str()
    }
}

///
/// RawLedgerEntry
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawLedgerEntry(Vec<u8>);

impl RawLedgerEntry {
    pub(crate) fn try_from_entry(entry: &LedgerEntry) -> Result<Self, InternalError> {
        let bytes = serialize(entry)?;
        if bytes.len() > MAX_LEDGER_ENTRY_BYTES as usize {
            return Err(InternalError::ledger_invariant(format!(
                "ledger entry exceeds max size: {} bytes (limit {MAX_LEDGER_ENTRY_BYTES})",
                bytes.len()
            )));
        }

        Ok(Self(bytes))
    }

    pub(crate) fn try_decode(&self) -> Result<LedgerEntry, InternalError> {
        deserialize::<LedgerEntry>(&self.0).map_err(|err| {
            InternalError::ledger_corruption(format!("ledger entry failed to deserialize: {err}"))
        })
    }
}

impl Storable for RawLedgerEntry {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        // Trusted store boundary: bounded by BOUND
        Self(bytes.into_owned())
    }

    fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: MAX_LEDGER_ENTRY_BYTES,
        is_fixed_size: false,
    };
}
