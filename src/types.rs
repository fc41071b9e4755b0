//! Static types carried by symbols and resolved expressions

use serde::Deserialize;
use std::fmt;

/// Closed set of static types known to the lowering engine
///
/// `Null` and `EmptyArray` only ever appear as the type of a literal source;
/// no symbol may be declared with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaticType {
    Int,
    Uint,
    Long,
    Ulong,
    Char,
    Uchar,
    Double,
    Bool,
    String,
    #[serde(alias = "variable")]
    Dynamic,
    Null,
    EmptyArray,
}

/// Destination families: the first level of the assignment decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    /// `int`, `uint`, `long`, `ulong`, `char`, `uchar`
    Integer,
    Double,
    Bool,
    String,
    Dynamic,
}

impl StaticType {
    pub const ALL: [StaticType; 12] = [
        StaticType::Int,
        StaticType::Uint,
        StaticType::Long,
        StaticType::Ulong,
        StaticType::Char,
        StaticType::Uchar,
        StaticType::Double,
        StaticType::Bool,
        StaticType::String,
        StaticType::Dynamic,
        StaticType::Null,
        StaticType::EmptyArray,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StaticType::Int => "int",
            StaticType::Uint => "uint",
            StaticType::Long => "long",
            StaticType::Ulong => "ulong",
            StaticType::Char => "char",
            StaticType::Uchar => "uchar",
            StaticType::Double => "double",
            StaticType::Bool => "bool",
            StaticType::String => "string",
            StaticType::Dynamic => "dynamic",
            StaticType::Null => "null",
            StaticType::EmptyArray => "empty-array",
        }
    }

    /// `int`, `uint`, `long` or `ulong`
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            StaticType::Int | StaticType::Uint | StaticType::Long | StaticType::Ulong
        )
    }

    /// `char` or `uchar`
    pub fn is_char(self) -> bool {
        matches!(self, StaticType::Char | StaticType::Uchar)
    }

    /// Integer or char family
    pub fn is_integral(self) -> bool {
        self.is_integer() || self.is_char()
    }

    /// Any unboxed scalar: integral, `double` or `bool`
    pub fn is_native_scalar(self) -> bool {
        self.is_integral() || matches!(self, StaticType::Double | StaticType::Bool)
    }

    /// Literal-only pseudo types
    pub fn is_pseudo(self) -> bool {
        matches!(self, StaticType::Null | StaticType::EmptyArray)
    }

    /// Family this type falls in when used as a destination; `None` for pseudo types
    pub fn family(self) -> Option<TypeFamily> {
        match self {
            StaticType::Int
            | StaticType::Uint
            | StaticType::Long
            | StaticType::Ulong
            | StaticType::Char
            | StaticType::Uchar => Some(TypeFamily::Integer),
            StaticType::Double => Some(TypeFamily::Double),
            StaticType::Bool => Some(TypeFamily::Bool),
            StaticType::String => Some(TypeFamily::String),
            StaticType::Dynamic => Some(TypeFamily::Dynamic),
            StaticType::Null | StaticType::EmptyArray => None,
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeFamily::Integer => "int",
            TypeFamily::Double => "double",
            TypeFamily::Bool => "bool",
            TypeFamily::String => "string",
            TypeFamily::Dynamic => "dynamic",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families() {
        assert_eq!(StaticType::Uchar.family(), Some(TypeFamily::Integer));
        assert_eq!(StaticType::Ulong.family(), Some(TypeFamily::Integer));
        assert_eq!(StaticType::Dynamic.family(), Some(TypeFamily::Dynamic));
        assert_eq!(StaticType::Null.family(), None);
        assert_eq!(StaticType::EmptyArray.family(), None);
    }

    #[test]
    fn test_deserialize_legacy_variable_name() {
        let ty: StaticType = serde_json::from_str("\"variable\"").unwrap_or(StaticType::Null);
        assert_eq!(ty, StaticType::Dynamic);
        let ty: StaticType = serde_json::from_str("\"empty-array\"").unwrap_or(StaticType::Null);
        assert_eq!(ty, StaticType::EmptyArray);
    }
}
