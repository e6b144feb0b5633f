use crate::{
    MAX_DISAMBIGUATION_FIELDS,
    db::{
        identity::{EntityName, EntityNameError},
        traits::FieldClause,
    },
    error::InternalError,
    traits::Disambiguatable,
};
use std::collections::HashMap;
use thiserror::Error as ThisError;

///
/// ConfigError
///
/// Invalid or missing disambiguation declarations. Raised when a host type
/// is registered (or used without registering), never deferred to a query.
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("{path} must declare at least one disambiguation field")]
    MissingFields { path: &'static str },

    #[error("{path} declares {len} disambiguation fields (max {max})")]
    TooManyFields {
        path: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{path} lists disambiguation field '{field}' more than once")]
    DuplicateField {
        path: &'static str,
        field: &'static str,
    },

    #[error("{path} has no field named '{field}'")]
    UnknownField {
        path: &'static str,
        field: &'static str,
    },

    #[error("{path} cannot disambiguate on its primary key '{field}'")]
    PrimaryKeyField {
        path: &'static str,
        field: &'static str,
    },

    #[error("{path} has an invalid entity name: {source}")]
    InvalidEntityName {
        path: &'static str,
        #[source]
        source: EntityNameError,
    },

    #[error("{path} is already registered")]
    AlreadyRegistered { path: &'static str },

    #[error("entity name '{entity}' of {path} is already used by {existing}")]
    EntityNameTaken {
        entity: EntityName,
        path: &'static str,
        existing: &'static str,
    },

    #[error("{path} is not registered for disambiguation")]
    NotRegistered { path: &'static str },

    #[error("model for {found} used with {expected}")]
    ModelMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

///
/// DisambiguationModel
///
/// Validated, runtime form of one host type's declaration.
/// Only constructible through [`DisambiguationModel::try_new`].
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DisambiguationModel {
    path: &'static str,
    entity: EntityName,
    fields: &'static [&'static str],
    always_disambiguate: bool,
}

impl DisambiguationModel {
    /// Validate a host type's declaration.
    pub fn try_new<E: Disambiguatable>() -> Result<Self, ConfigError> {
        let path = E::PATH;
        let fields = E::DISAMBIGUATION_FIELDS;

        if fields.is_empty() {
            return Err(ConfigError::MissingFields { path });
        }
        if fields.len() > MAX_DISAMBIGUATION_FIELDS {
            return Err(ConfigError::TooManyFields {
                path,
                len: fields.len(),
                max: MAX_DISAMBIGUATION_FIELDS,
            });
        }

        for (i, &field) in fields.iter().enumerate() {
            if fields[..i].contains(&field) {
                return Err(ConfigError::DuplicateField { path, field });
            }
            if field == E::PRIMARY_KEY {
                return Err(ConfigError::PrimaryKeyField { path, field });
            }
            if !E::FIELDS.contains(&field) {
                return Err(ConfigError::UnknownField { path, field });
            }
        }

        let entity = EntityName::try_from_str(E::ENTITY_NAME)
            .map_err(|source| ConfigError::InvalidEntityName { path, source })?;

        Ok(Self {
            path,
            entity,
            fields,
            always_disambiguate: E::ALWAYS_DISAMBIGUATE,
        })
    }

    #[must_use]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    #[must_use]
    pub const fn entity(&self) -> EntityName {
        self.entity
    }

    #[must_use]
    pub const fn fields(&self) -> &'static [&'static str] {
        self.fields
    }

    #[must_use]
    pub const fn always_disambiguate(&self) -> bool {
        self.always_disambiguate
    }

    /// Disambiguator reported for a host that has no ledger entry.
    #[must_use]
    pub const fn default_disambiguator(&self) -> Option<u32> {
        if self.always_disambiguate {
            Some(0)
        } else {
            None
        }
    }

    /// Reject use of this model with a type it was not built for.
    pub(crate) fn ensure_for<E: Disambiguatable>(&self) -> Result<(), InternalError> {
        if self.path == E::PATH {
            return Ok(());
        }

        Err(ConfigError::ModelMismatch {
            expected: E::PATH,
            found: self.path,
        }
        .into())
    }

    /// Exact-match clauses selecting the duplicate group of `record`.
    pub fn clauses_for<E: Disambiguatable>(
        &self,
        record: &E,
    ) -> Result<Vec<FieldClause>, InternalError> {
        self.ensure_for::<E>()?;

        self.fields
            .iter()
            .map(|&field| {
                let value = record.get_value(field).ok_or_else(|| {
                    InternalError::engine_invariant(format!(
                        "{} declares field '{field}' but returned no value for it",
                        self.path
                    ))
                })?;

                Ok(FieldClause { field, value })
            })
            .collect()
    }
}

///
/// EntityRegistry
///
/// Host types registered for disambiguation, keyed by type path.
///

#[derive(Debug, Default)]
pub struct EntityRegistry {
    models: HashMap<&'static str, DisambiguationModel>,
    names: HashMap<EntityName, &'static str>,
}

impl EntityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a host type.
    pub fn register<E: Disambiguatable>(&mut self) -> Result<DisambiguationModel, InternalError> {
        let model = DisambiguationModel::try_new::<E>()?;

        if self.models.contains_key(model.path) {
            return Err(ConfigError::AlreadyRegistered { path: model.path }.into());
        }
        if let Some(&existing) = self.names.get(&model.entity) {
            return Err(ConfigError::EntityNameTaken {
                entity: model.entity,
                path: model.path,
                existing,
            }
            .into());
        }

        self.models.insert(model.path, model);
        self.names.insert(model.entity, model.path);

        Ok(model)
    }

    /// Look up the model of a registered type.
    pub fn try_get<E: Disambiguatable>(&self) -> Result<DisambiguationModel, InternalError> {
        self.models
            .get(E::PATH)
            .copied()
            .ok_or_else(|| ConfigError::NotRegistered { path: E::PATH }.into())
    }

    #[must_use]
    pub fn is_registered<E: Disambiguatable>(&self) -> bool {
        self.models.contains_key(E::PATH)
    }

    /// Iterate registered models.
    pub fn iter(&self) -> impl Iterator<Item = &DisambiguationModel> {
        self.models.values()
    }
}

///
/// TESTS
///
