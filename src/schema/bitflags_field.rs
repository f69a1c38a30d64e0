//! Bitflag sets backed by an integer. Thin wrapper around the `bitflags`
//! crate (already in the example pack's dependency stacks, e.g.
//! `apfs-core`/`apfs-types`) so every flag set in `structure/` gets
//! `Debug`/`PartialEq`/bitwise ops for free.

/// Declares a `bitflags`-backed flag set plus little-endian read/write
/// helpers, paralleling [`super::enums::enum_by_value`] for flag fields.
macro_rules! le_bitflags {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $repr:ty {
            $( const $flag:ident = $value:expr; )*
        }
    ) => {
        ::bitflags::bitflags! {
            $(#[$meta])*
            #[derive(Clone, Copy, PartialEq, Eq, Debug)]
            $vis struct $name: $repr {
                $( const $flag = $value; )*
            }
        }
    };
}

pub(crate) use le_bitflags;
