//! Enumerations backed by an integer, with unknown values tolerated as an
//! `UNKNOWN` sentinel — the Rust replacement for the original's run-time
//! name lookup for dynamic enum-by-name coercion: every enum
//! carries `from_value`/`to_value` via this trait, registered at
//! declaration time through `#[derive]`-free `impl` blocks generated by the
//! [`enum_by_value`] macro, so there is no reflection involved.

/// Implemented by every integer-backed enum in `structure/`.
pub trait EnumByValue: Sized + Copy {
    type Repr: Copy;

    fn from_value(v: Self::Repr) -> Self;
    fn to_value(self) -> Self::Repr;
}

/// Declares an integer-backed enum with an explicit `Unknown(repr)` fallback
/// variant and `EnumByValue` impl, e.g.:
///
/// ```ignore
/// enum_by_value! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub enum KeyType: u8 {
///         InodeItem = 1,
///         DirItem = 84,
///     }
/// }
/// ```
macro_rules! enum_by_value {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ty {
            $( $variant:ident = $value:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $variant ),*,
            /// Any value not named above. Tolerated, not an error.
            Unknown($repr),
        }

        impl $crate::schema::enums::EnumByValue for $name {
            type Repr = $repr;

            fn from_value(v: $repr) -> Self {
                match v {
                    $( $value => $name::$variant, )*
                    other => $name::Unknown(other),
                }
            }

            fn to_value(self) -> $repr {
                match self {
                    $( $name::$variant => $value, )*
                    $name::Unknown(v) => v,
                }
            }
        }
    };
}

pub(crate) use enum_by_value;

#[cfg(test)]
mod tests {
    use super::*;

    enum_by_value! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Sample: u8 {
            A = 1,
            B = 2,
        }
    }

    #[test]
    fn known_and_unknown_roundtrip() {
        assert_eq!(Sample::from_value(1), Sample::A);
        assert_eq!(Sample::A.to_value(), 1);
        assert_eq!(Sample::from_value(200), Sample::Unknown(200));
        assert_eq!(Sample::Unknown(200).to_value(), 200);
    }
}
