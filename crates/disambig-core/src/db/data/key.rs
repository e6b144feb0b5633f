#![expect(clippy::cast_possible_truncation)]
use crate::{
    db::{
        identity::{EntityName, IdentityDecodeError, RecordId},
        registry::ConfigError,
    },
    error::InternalError,
    traits::HostRecord,
};
use canic_cdk::structures::{Storable, storable::Bound};
use std::{
    borrow::Cow,
    fmt::{self, Display},
};
use thiserror::Error as ThisError;

///
/// DataKeyDecodeError
/// (decode / corruption boundary)
///

#[derive(Debug, ThisError)]
pub(crate) enum DataKeyDecodeError {
    #[error("invalid entity name")]
    Entity(#[source] IdentityDecodeError),

    #[error("invalid record id")]
    Id(#[source] IdentityDecodeError),
}

///
/// DataKey
///
/// Tagged key `(entity name, record id)`. Host rows and ledger entries are
/// both addressed by it: a ledger entry lives under the key of the row it
/// disambiguates.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DataKey {
    entity: EntityName,
    id: RecordId,
}

impl DataKey {
    /// Fixed on-disk size in bytes (stable, protocol-level)
    pub const STORED_SIZE_BYTES: u64 = EntityName::STORED_SIZE_BYTES + RecordId::STORED_SIZE_BYTES;

    /// Fixed in-memory size (for buffers and arrays only)
    pub const STORED_SIZE_USIZE: usize = Self::STORED_SIZE_BYTES as usize;

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn new(entity: EntityName, id: RecordId) -> Self {
        Self { entity, id }
    }

    /// Construct using compile-time host metadata.
    pub fn try_for<E: HostRecord>(id: RecordId) -> Result<Self, InternalError> {
        Ok(Self::new(Self::entity_for::<E>()?, id))
    }

    #[must_use]
    pub const fn lower_bound(entity: EntityName) -> Self {
        Self::new(entity, RecordId::MIN)
    }

    #[must_use]
    pub const fn upper_bound(entity: EntityName) -> Self {
        Self::new(entity, RecordId::MAX)
    }

    pub(crate) fn entity_for<E: HostRecord>() -> Result<EntityName, InternalError> {
        EntityName::try_from_str(E::ENTITY_NAME).map_err(|source| {
            ConfigError::InvalidEntityName {
                path: E::PATH,
                source,
            }
            .into()
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn entity(&self) -> EntityName {
        self.entity
    }

    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    // ------------------------------------------------------------------
    // Encoding / decoding
    // ------------------------------------------------------------------

    /// Encode into fixed-size on-disk representation.
    #[must_use]
    pub fn to_raw(&self) -> RawDataKey {
        let mut buf = [0u8; Self::STORED_SIZE_USIZE];

        buf[..EntityName::STORED_SIZE_USIZE].copy_from_slice(&self.entity.to_bytes());
        buf[EntityName::STORED_SIZE_USIZE..].copy_from_slice(&self.id.to_bytes());

        RawDataKey(buf)
    }

    pub(crate) fn try_from_raw(raw: &RawDataKey) -> Result<Self, DataKeyDecodeError> {
        let bytes = &raw.0;

        let entity = EntityName::from_bytes(&bytes[..EntityName::STORED_SIZE_USIZE])
            .map_err(DataKeyDecodeError::Entity)?;
        let id = RecordId::from_bytes(&bytes[EntityName::STORED_SIZE_USIZE..])
            .map_err(DataKeyDecodeError::Id)?;

        Ok(Self { entity, id })
    }
}

impl Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.id)
    }
}

///
/// RawDataKey
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RawDataKey([u8; DataKey::STORED_SIZE_USIZE]);

impl RawDataKey {
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DataKey::STORED_SIZE_USIZE] {
        &self.0
    }
}

impl Storable for RawDataKey {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        // Fixed-size storable contract: fail closed on any mismatch so a
        // malformed payload never decodes into a valid-looking key.
        debug_assert_eq!(
            bytes.len(),
            DataKey::STORED_SIZE_USIZE,
            "RawDataKey::from_bytes received unexpected byte length",
        );

        if bytes.len() != DataKey::STORED_SIZE_USIZE {
            return Self([0u8; DataKey::STORED_SIZE_USIZE]);
        }

        let mut out = [0u8; DataKey::STORED_SIZE_USIZE];
        out.copy_from_slice(bytes.as_ref());
        Self(out)
    }

    fn into_bytes(self) -> Vec<u8> {
        self.0.to_vec()
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: DataKey::STORED_SIZE_BYTES as u32,
        is_fixed_size: true,
    };
}

///
/// TESTS
///
