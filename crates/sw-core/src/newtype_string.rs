//! Macro for defining strongly-typed SQL identifier newtypes.
//!
//! Every identifier newtype shares one invariant: the name is non-empty and
//! made only of ASCII letters, digits, `_` and `.` (the dot separates a schema
//! qualifier). Names that satisfy it can be interpolated into DDL after
//! quoting without further escaping concerns.

/// Return `true` if `name` is a usable SQL identifier.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.ends_with('.')
        && !name.contains("..")
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.')
}

/// Define a strongly-typed SQL identifier newtype.
///
/// Generates:
/// - The struct with `Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize`
/// - Custom `Deserialize` (rejects invalid identifiers)
/// - `new()` (panics on invalid input), `try_new()` (returns Option), `as_str()`
/// - `Display`, `AsRef<str>`, `Deref<Target=str>`
/// - `TryFrom<&str>`, `PartialEq<&str>`
macro_rules! define_identifier {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $Name::try_new(s).ok_or_else(|| {
                    serde::de::Error::custom(concat!(stringify!($Name), " is not a valid SQL identifier"))
                })
            }
        }

        impl $Name {
            /// Create a new instance, panicking if the name is not a valid identifier.
            ///
            /// Intended for names written in code; prefer
            /// [`try_new`](Self::try_new) for anything read at run time.
            pub fn new(name: impl Into<String>) -> Self {
                let s = name.into();
                assert!(
                    $crate::newtype_string::is_valid_identifier(&s),
                    concat!(stringify!($Name), " is not a valid SQL identifier: {}"),
                    s
                );
                Self(s)
            }

            /// Try to create a new instance, returning `None` for invalid names.
            pub fn try_new(name: impl Into<String>) -> Option<Self> {
                let s = name.into();
                if $crate::newtype_string::is_valid_identifier(&s) {
                    Some(Self(s))
                } else {
                    None
                }
            }

            /// Return the underlying name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the name wrapped in SQL identifier quotes.
            pub fn quoted(&self) -> String {
                $crate::sql_utils::quote_qualified(&self.0)
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str { &self.0 }
        }

        impl TryFrom<&str> for $Name {
            type Error = String;
            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::try_new(s).ok_or_else(|| {
                    format!(concat!(stringify!($Name), " is not a valid SQL identifier: {}"), s)
                })
            }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool { self.0 == *other }
        }
    };
}

pub(crate) use define_identifier;
