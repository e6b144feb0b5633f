use serde::{Deserialize, Serialize};

///
/// Value
///
/// Comparable field value used for exact-match group resolution.
///
/// Null  → the field is unset (Option::None). Two unset fields are equal,
///         so records that leave every disambiguation field empty still
///         form a duplicate group.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

macro_rules! impl_from_for_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool    => Bool,
    i8      => Int,
    i16     => Int,
    i32     => Int,
    i64     => Int,
    u8      => Uint,
    u16     => Uint,
    u32     => Uint,
    u64     => Uint,
    String  => Text,
    Vec<u8> => Blob,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_becomes_null() {
        let v: Value = Option::<String>::None.into();
        assert!(v.is_null());

        let v: Value = Some("Foo").into();
        assert_eq!(v, Value::Text("Foo".to_string()));
    }

    #[test]
    fn nulls_compare_equal() {
        assert_eq!(Value::from(Option::<u32>::None), Value::Null);
    }

    #[test]
    fn signed_and_unsigned_do_not_collapse() {
        assert_ne!(Value::from(1i32), Value::from(1u32));
        assert_eq!(Value::from(1i32), Value::Int(1));
        assert_eq!(Value::from(1u32), Value::Uint(1));
    }
}
