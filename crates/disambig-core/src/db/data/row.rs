use crate::{
    error::InternalError,
    serialize::{deserialize, serialize},
    traits::HostRecord,
};
use canic_cdk::structures::{Storable, storable::Bound};
use std::borrow::Cow;
use thiserror::Error as ThisError;

///
/// RawRowError
/// Construction / storage-boundary errors.
///

#[derive(Debug, ThisError)]
pub(crate) enum RawRowError {
    #[error("row exceeds max size: {len} bytes (limit {MAX_ROW_BYTES})")]
    TooLarge { len: usize },
}

impl From<RawRowError> for InternalError {
    fn from(err: RawRowError) -> Self {
        Self::store_internal(err.to_string())
    }
}

///
/// RawRow
///

/// Max serialized bytes for a single row (protocol-level limit).
pub(crate) const MAX_ROW_BYTES: u32 = 4 * 1024 * 1024;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawRow(Vec<u8>);

impl RawRow {
    /// Construct a raw row from serialized bytes.
    pub(crate) fn try_new(bytes: Vec<u8>) -> Result<Self, RawRowError> {
        if bytes.len() > MAX_ROW_BYTES as usize {
            return Err(RawRowError::TooLarge { len: bytes.len() });
        }
        Ok(Self(bytes))
    }

    /// Encode a host record into a storable row.
    pub(crate) fn try_from_record<E: HostRecord>(record: &E) -> Result<Self, InternalError> {
        let bytes = serialize(record)?;

        Ok(Self::try_new(bytes)?)
    }

    /// Decode into a host record.
    pub(crate) fn try_decode<E: HostRecord>(&self) -> Result<E, InternalError> {
        deserialize::<E>(&self.0).map_err(|err| {
            InternalError::store_corruption(format!("row failed to deserialize: {err}"))
        })
    }
}

impl Storable for RawRow {
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
        max_size: MAX_ROW_BYTES,
        is_fixed_size: false,
    };
}

///
/// TESTS
///
