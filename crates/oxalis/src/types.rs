//! Bitmask type tags.
//!
//! Every value has a single-bit type tag; a mask is a bitwise-or of tags
//! expressing a set of admissible variants. Masks drive both the predicate
//! layer and the optional `typedef` argument/return assertions.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// A set of type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeMask(pub u32);

impl TypeMask {
    pub const LIST: Self = Self(0x0000_0002);
    pub const VECTOR: Self = Self(0x0000_0004);
    pub const SEQUENCE: Self = Self(0x0000_0006);
    pub const INTEGER: Self = Self(0x0000_0008);
    pub const FLOAT: Self = Self(0x0000_0010);
    pub const NUMBER: Self = Self(0x0000_0018);
    pub const BOOLEAN: Self = Self(0x0000_0020);
    pub const STRING: Self = Self(0x0000_0040);
    pub const CHARACTER: Self = Self(0x0000_0080);
    pub const SYMBOL: Self = Self(0x0000_0100);
    pub const STRINGY: Self = Self(0x0000_0140);
    pub const FUNCTION: Self = Self(0x0000_0200);
    pub const MACRO: Self = Self(0x0000_0400);
    pub const PRIMITIVE: Self = Self(0x0000_0800);
    pub const PROCEDURE: Self = Self(0x0000_0A00);
    pub const BOXED_OBJECT: Self = Self(0x0000_1000);
    pub const FRAME: Self = Self(0x0000_2000);
    pub const ENVIRONMENT: Self = Self(0x0000_4000);
    pub const PORT: Self = Self(0x0000_8000);
    pub const ANY: Self = Self(0xFFFF_FFFF);

    /// A value whose tag is `tag` satisfies this mask iff the tag
    /// intersects it.
    #[inline]
    #[must_use]
    pub fn admits(self, tag: Self) -> bool {
        self.0 & tag.0 != 0
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Canonical type names, as written in `typedef` specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
enum TypeName {
    List,
    Vector,
    Sequence,
    Integer,
    Float,
    Number,
    Boolean,
    String,
    Character,
    Symbol,
    Stringy,
    Function,
    Macro,
    Primitive,
    Procedure,
    BoxedObject,
    Frame,
    Environment,
    Port,
    AnyType,
}

impl TypeName {
    fn mask(self) -> TypeMask {
        match self {
            Self::List => TypeMask::LIST,
            Self::Vector => TypeMask::VECTOR,
            Self::Sequence => TypeMask::SEQUENCE,
            Self::Integer => TypeMask::INTEGER,
            Self::Float => TypeMask::FLOAT,
            Self::Number => TypeMask::NUMBER,
            Self::Boolean => TypeMask::BOOLEAN,
            Self::String => TypeMask::STRING,
            Self::Character => TypeMask::CHARACTER,
            Self::Symbol => TypeMask::SYMBOL,
            Self::Stringy => TypeMask::STRINGY,
            Self::Function => TypeMask::FUNCTION,
            Self::Macro => TypeMask::MACRO,
            Self::Primitive => TypeMask::PRIMITIVE,
            Self::Procedure => TypeMask::PROCEDURE,
            Self::BoxedObject => TypeMask::BOXED_OBJECT,
            Self::Frame => TypeMask::FRAME,
            Self::Environment => TypeMask::ENVIRONMENT,
            Self::Port => TypeMask::PORT,
            Self::AnyType => TypeMask::ANY,
        }
    }
}

/// Resolves a single type name to its mask.
#[must_use]
pub fn mask_for_name(name: &str) -> Option<TypeMask> {
    name.parse::<TypeName>().ok().map(TypeName::mask)
}

/// Parses a `|`-separated type spec into a mask.
///
/// Returns the offending token on failure so the caller can report an
/// `InvalidType` error with it.
pub fn spec_to_mask(spec: &str) -> Result<TypeMask, &str> {
    let mut mask = TypeMask(0);
    for token in spec.split('|') {
        match mask_for_name(token) {
            Some(bit) => mask = mask.union(bit),
            None => return Err(token),
        }
    }
    Ok(mask)
}

/// Renders a mask as a spec string: the canonical name when the mask matches
/// one exactly, else the single-bit names joined with `|`.
#[must_use]
pub fn mask_name(mask: TypeMask) -> String {
    for name in TypeName::iter() {
        if name.mask() == mask {
            let s: &'static str = name.into();
            return s.to_owned();
        }
    }
    let mut parts = Vec::new();
    for name in TypeName::iter() {
        let bit = name.mask();
        if bit.0.count_ones() == 1 && mask.admits(bit) {
            let s: &'static str = name.into();
            parts.push(s);
        }
    }
    parts.join("|")
}

impl fmt::Display for TypeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask_name(*self))
    }
}

/// Declared argument and return masks for a named function, registered by
/// `typedef` and enforced on application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSignature {
    pub args: Vec<TypeMask>,
    pub ret: TypeMask,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_masks_match_table() {
        assert_eq!(TypeMask::SEQUENCE, TypeMask::LIST.union(TypeMask::VECTOR));
        assert_eq!(TypeMask::NUMBER, TypeMask::INTEGER.union(TypeMask::FLOAT));
        assert_eq!(TypeMask::STRINGY, TypeMask::STRING.union(TypeMask::SYMBOL));
        assert_eq!(TypeMask::PROCEDURE, TypeMask::FUNCTION.union(TypeMask::PRIMITIVE));
    }

    #[test]
    fn spec_parsing() {
        assert_eq!(spec_to_mask("integer|float"), Ok(TypeMask::NUMBER));
        assert_eq!(spec_to_mask("anytype"), Ok(TypeMask::ANY));
        assert_eq!(spec_to_mask("integer|bogus"), Err("bogus"));
    }

    #[test]
    fn mask_naming_round_trip() {
        assert_eq!(mask_name(TypeMask::NUMBER), "number");
        assert_eq!(mask_name(TypeMask::STRING), "string");
        assert_eq!(mask_name(TypeMask::INTEGER.union(TypeMask::STRING)), "integer|string");
    }
}
