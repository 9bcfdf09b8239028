//! Helper macros for parsing the packed trailer rows.
//!
//! The trailer is a flat run of little-endian fields, so a
//! struct is read field by field in declaration order. The
//! macros mimic a derive: each declared struct gets a
//! [`Parseable`] impl whose errors name the failing field.
#![allow(unused_macros)]

use byteordered::{byteorder::ReadBytesExt, ByteOrdered, Endian};

use crate::error::{Error, Result};

/// Declare a [`Parseable`] struct.
///
/// Fields are written `name => ty` or `name => ty as ty2`;
/// the latter reads `ty` and stores it converted with `as`.
/// Field attributes (doc comments, serde attributes) are
/// passed through.
macro_rules! declare_parseable_struct {
    (
        $(#[$smeta:meta])*
            $svis:vis struct $sname:ident {
                #format => $errh:expr,
                $(
                    $(#[$fmeta:meta])*
                    $fvis:vis $name:ident $(as $err:expr)? => $ty:ty $(as $ty2:ty)?
                ),* $(,)?
            }
    ) => {

        $(#[$smeta])* #[allow(dead_code)]
            $svis struct $sname {
                $( $(#[$fmeta])* $fvis $name: declaration_type!($ty $(as $ty2)?) ),*
            }

        impl crate::parse::Parseable for $sname {
            fn parse<T: byteordered::byteorder::ReadBytesExt, E: byteordered::Endian>(
                r: &mut byteordered::ByteOrdered<T, E>,
            ) -> crate::error::Result<Self> {
                parse_as_bindings!(
                    r, #format => $errh,
                    $( $name $(as $err)? => $ty $(as $ty2)? ),*
                );
                Ok($sname {
                    $( $name ),*
                })
            }
        }
    };
    (
        $(#[$smeta:meta])*
            $svis:vis struct $sname:ident {
                $(
                    $(#[$fmeta:meta])*
                    $fvis:vis $name:ident $(as $err:expr)? => $ty:ty $(as $ty2:ty)?
                ),* $(,)?
            }
    ) => {
        declare_parseable_struct! {
            $(#[$smeta])*
                $svis struct $sname {
                    #format => |e| format!("field `{}.{}`", stringify!($sname), e),
                    $( $(#[$fmeta])* $fvis $name $(as $err)? => $ty $(as $ty2)? ),*
                }
        }
    };
}

/// Expands to the stored type: the converted type if one
/// is given, else the parsed type.
macro_rules! declaration_type {
    ($ty:ty as $ty2:ty) => {
        $ty2
    };
    ($ty:ty) => {
        $ty
    };
}

/// Generate `let` bindings by parsing a reader.
macro_rules! parse_as_bindings {
    (
        $rdr: expr $(, #format => $errh:expr)?,
        $( $name:ident $(as $err:expr)? => $ty:ty $(as $ty2:ty)? ),* $(,)?
    ) => {
        #[allow(unused_parens)]
        let ($($name),*) = parse_from_reader!(
            $rdr $(, $errh)?,
            $( $ty $(as $ty2)? => stringify_binding!($name $(as $err)?) ),*
        );
    };
}

/// Error context for a binding: the given expression, or
/// the identifier itself.
macro_rules! stringify_binding {
    ($name: ident as $err:expr) => {
        $err
    };
    ($name: ident) => {
        stringify!($name)
    };
}

/// Evaluate to a tuple of values parsed from a reader, in
/// order.
macro_rules! parse_from_reader {
    ($rdr: expr, $errh: expr, $( $ty:ty $(as $ty2:ty)? => $err:expr ),* $(,)?) => {{
        let mut rdr = $rdr;
        ($(
            <$ty as crate::parse::Parseable>::parse(&mut rdr)
                .map_err(|e| e.context(($errh)($err)))? $(as $ty2)?
        ),*)
    }};
    ($rdr: expr, $( $ty:ty $(as $ty2:ty)? => $err:expr ),* $(,)?) => {{
        parse_from_reader!($rdr, |e| format!("field `{}`", e), $( $ty $(as $ty2)? => $err ),*)
    }};
}

pub(crate) trait Parseable: Sized {
    fn parse<T: ReadBytesExt, E: Endian>(r: &mut ByteOrdered<T, E>) -> Result<Self>;
}

macro_rules! impl_parseable {
    ($ty:ty, $method:ident) => {
        impl Parseable for $ty {
            fn parse<T: ReadBytesExt, E: Endian>(r: &mut ByteOrdered<T, E>) -> Result<$ty> {
                Ok(r.$method()?)
            }
        }
    };
}

impl_parseable!(u8, read_u8);
impl_parseable!(u16, read_u16);
impl_parseable!(i16, read_i16);
impl_parseable!(u32, read_u32);
impl_parseable!(f32, read_f32);

impl<Ty, const N: usize> Parseable for [Ty; N]
where
    Ty: Parseable,
    [Ty; N]: Default,
{
    fn parse<T: ReadBytesExt, E: Endian>(r: &mut ByteOrdered<T, E>) -> Result<Self> {
        let mut out: [Ty; N] = Default::default();
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = Ty::parse(r).map_err(|e| e.context(format_args!("element {}", i)))?;
        }
        Ok(out)
    }
}

/// Parse a little-endian `T` located at `offset` inside
/// `bytes`.
///
/// `what` names the value in the error when the buffer
/// ends before `offset`.
pub(crate) fn parse_le_at<T: Parseable>(bytes: &[u8], offset: usize, what: &str) -> Result<T> {
    let tail = bytes.get(offset..).ok_or_else(|| {
        Error::MalformedMetadata(format!(
            "{}: offset {} is past the end of a {} byte buffer",
            what,
            offset,
            bytes.len()
        ))
    })?;
    T::parse(&mut ByteOrdered::le(tail)).map_err(|e| e.context(what))
}
