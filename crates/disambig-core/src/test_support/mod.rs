//! Test memory and fixture host types shared by unit tests.

use crate::{
    db::identity::RecordId,
    error::HookError,
    traits::{Disambiguatable, FieldValues, HostRecord, Path},
    value::Value,
};
use canic_cdk::structures::{
    DefaultMemoryImpl,
    memory::{MemoryId, MemoryManager, VirtualMemory},
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Fresh virtual memory for one store. Each call builds its own manager, so
/// ids only need to be distinct within a test.
pub(crate) fn test_memory(id: u8) -> VirtualMemory<DefaultMemoryImpl> {
    let manager = MemoryManager::init(DefaultMemoryImpl::default());
    manager.get(MemoryId::new(id))
}

// Fixture host with one id and three optional text fields.
macro_rules! host_fixture {
    ($name:ident, $entity:expr) => {
        #[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
        pub(crate) struct $name {
            pub(crate) id: RecordId,
            pub(crate) field_1: Option<String>,
            pub(crate) field_2: Option<String>,
            pub(crate) field_3: Option<String>,
        }

        #[allow(dead_code)]
        impl $name {
            pub(crate) fn new(id: u64, field_1: Option<&str>, field_2: Option<&str>) -> Self {
                Self {
                    id: RecordId(id),
                    field_1: field_1.map(str::to_string),
                    field_2: field_2.map(str::to_string),
                    field_3: None,
                }
            }

            pub(crate) fn with_field_3(mut self, value: &str) -> Self {
                self.field_3 = Some(value.to_string());
                self
            }
        }

        impl Path for $name {
            const PATH: &'static str = concat!("test_support::", stringify!($name));
        }

        impl FieldValues for $name {
            fn get_value(&self, field: &str) -> Option<Value> {
                match field {
                    "id" => Some(Value::from(self.id.get())),
                    "field_1" => Some(Value::from(self.field_1.clone())),
                    "field_2" => Some(Value::from(self.field_2.clone())),
                    "field_3" => Some(Value::from(self.field_3.clone())),
                    _ => None,
                }
            }
        }

        impl HostRecord for $name {
            const ENTITY_NAME: &'static str = $entity;
            const PRIMARY_KEY: &'static str = "id";
            const FIELDS: &'static [&'static str] = &["id", "field_1", "field_2", "field_3"];

            fn id(&self) -> RecordId {
                self.id
            }
        }
    };
}

//
// Valid fixtures
//

host_fixture!(Dummy, "dummy");

impl Disambiguatable for Dummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &["field_1", "field_2"];
}

host_fixture!(AlwaysDummy, "always_dummy");

impl Disambiguatable for AlwaysDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &["field_1", "field_2"];
    const ALWAYS_DISAMBIGUATE: bool = true;
}

host_fixture!(HookedDummy, "hooked_dummy");

thread_local! {
    static HOOK_CALLS: RefCell<Vec<(u64, u32)>> = const { RefCell::new(Vec::new()) };
}

/// Drain the `(id, index)` pairs `HookedDummy` was notified with.
pub(crate) fn take_hook_calls() -> Vec<(u64, u32)> {
    HOOK_CALLS.with(|calls| calls.take())
}

impl Disambiguatable for HookedDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &["field_1", "field_2"];

    fn after_disambiguated(&self, disambiguator: u32) -> Result<(), HookError> {
        HOOK_CALLS.with(|calls| calls.borrow_mut().push((self.id.get(), disambiguator)));
        Ok(())
    }
}

host_fixture!(FailingHookDummy, "failing_dummy");

impl Disambiguatable for FailingHookDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &["field_1", "field_2"];

    fn after_disambiguated(&self, _disambiguator: u32) -> Result<(), HookError> {
        Err(HookError::new(Self::PATH, "refused"))
    }
}

//
// Invalid fixtures
//

host_fixture!(NoFieldsDummy, "no_fields");

impl Disambiguatable for NoFieldsDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &[];
}

host_fixture!(UnknownFieldDummy, "unknown_field");

impl Disambiguatable for UnknownFieldDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &["field_1", "nope"];
}

host_fixture!(DuplicateFieldDummy, "duplicate_field");

impl Disambiguatable for DuplicateFieldDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &["field_1", "field_1"];
}

host_fixture!(PkFieldDummy, "pk_field");

impl Disambiguatable for PkFieldDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &["field_1", "id"];
}

host_fixture!(TooManyFieldsDummy, "too_many_fields");

impl Disambiguatable for TooManyFieldsDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] =
        &["field_1", "field_2", "field_3", "id", "field_1"];
}

host_fixture!(BadNameDummy, "dümmy");

impl Disambiguatable for BadNameDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &["field_1"];
}

// Same entity name as `Dummy` under a different path.
host_fixture!(TwinDummy, "dummy");

impl Disambiguatable for TwinDummy {
    const DISAMBIGUATION_FIELDS: &'static [&'static str] = &["field_1"];
}
