//! Macro for enums that travel over the wire by numeric identifier
//!
//! Wire enums serialize as their stable numeric id, never by name, so a
//! variant can be renamed without breaking the remote service. The macro also
//! provides a lowercase `Display`/`FromStr` pair for logs and config files.
//!
//! # Example
//!
//! ```rust
//! use codetrail_domain::impl_wire_enum;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Severity {
//!     Low,
//!     High,
//! }
//!
//! impl_wire_enum!(Severity {
//!     Low => 0, "low",
//!     High => 1, "high",
//! });
//!
//! assert_eq!(Severity::High.id(), 1);
//! assert_eq!(Severity::from_id(0), Some(Severity::Low));
//! assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "1");
//! ```

/// Implements numeric id conversions, serde, `Display` and `FromStr` for a
/// fieldless enum.
///
/// Deserializing an unknown id fails with [`DecodeError::UnknownId`](crate::DecodeError).
#[macro_export]
macro_rules! impl_wire_enum {
    ($enum_name:ident { $($variant:ident => $id:literal, $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Stable numeric identifier used on the wire.
            pub const fn id(self) -> u8 {
                match self {
                    $(Self::$variant => $id,)+
                }
            }

            /// Reverse lookup of [`Self::id`].
            pub const fn from_id(id: u8) -> Option<Self> {
                match id {
                    $($id => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }

        impl serde::Serialize for $enum_name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_u8(self.id())
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = i64::deserialize(deserializer)?;
                u8::try_from(raw)
                    .ok()
                    .and_then(Self::from_id)
                    .ok_or_else(|| {
                        serde::de::Error::custom($crate::DecodeError::UnknownId(
                            stringify!($enum_name),
                            raw,
                        ))
                    })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestLevel {
        Quiet,
        Loud,
    }

    impl_wire_enum!(TestLevel {
        Quiet => 3, "quiet",
        Loud => 9, "loud",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(TestLevel::Quiet.to_string(), "quiet");
        assert_eq!(TestLevel::Loud.to_string(), "loud");
    }

    #[test]
    fn test_fromstr_mixed_case() {
        assert_eq!(TestLevel::from_str("QuIeT").unwrap(), TestLevel::Quiet);
        assert!(TestLevel::from_str("").is_err());
    }

    #[test]
    fn test_serializes_by_id_not_name() {
        assert_eq!(serde_json::to_string(&TestLevel::Loud).unwrap(), "9");
        let parsed: TestLevel = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, TestLevel::Quiet);
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        let err = serde_json::from_str::<TestLevel>("4").unwrap_err();
        assert!(err.to_string().contains("unknown TestLevel id 4"));

        assert!(serde_json::from_str::<TestLevel>("-1").is_err());
        assert!(serde_json::from_str::<TestLevel>("\"loud\"").is_err());
    }
}
