use std::fmt;

const INTEGER_TYPES: &[&str] = &[
    "integer",
    "positiveInteger",
    "nonNegativeInteger",
    "negativeInteger",
    "nonPositiveInteger",
    "int",
    "long",
    "short",
    "byte",
    "unsignedInt",
    "unsignedLong",
    "unsignedShort",
    "unsignedByte",
];

// Odoo has no decimal field; Float is the better default.
const FLOAT_TYPES: &[&str] = &["float", "decimal", "double"];

const CHAR_TYPES: &[&str] = &[
    "string",
    "NMTOKEN",
    "ID",
    "IDREF",
    "IDREFS",
    "anyURI",
    "base64Binary",
    "normalizedString",
    "language",
    "token",
];

/// Datatype codes or raw xsd types of date fields.
pub const DATE_TYPES: &[&str] = &["date", "TData"];

/// Datatype codes or raw xsd types of datetime fields.
pub const DATETIME_TYPES: &[&str] = &["dateTime", "TDateTimeUTC"];

const BOOLEAN_TYPES: &[&str] = &["boolean"];

/// Group of XSD builtin datatypes mapped to the same Odoo field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatatypeFamily {
    Integer,
    Float,
    Char,
    Date,
    Datetime,
    Boolean,
}

/// Family of a datatype code, `None` for unmapped datatypes.
pub fn datatype_family(code: &str) -> Option<DatatypeFamily> {
    let family = if INTEGER_TYPES.contains(&code) {
        DatatypeFamily::Integer
    } else if FLOAT_TYPES.contains(&code) {
        DatatypeFamily::Float
    } else if CHAR_TYPES.contains(&code) {
        DatatypeFamily::Char
    } else if DATE_TYPES.contains(&code) {
        DatatypeFamily::Date
    } else if DATETIME_TYPES.contains(&code) {
        DatatypeFamily::Datetime
    } else if BOOLEAN_TYPES.contains(&code) {
        DatatypeFamily::Boolean
    } else {
        return None;
    };
    Some(family)
}

/// Odoo field constructors the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Char,
    Integer,
    Float,
    Monetary,
    Date,
    Datetime,
    Boolean,
    Selection,
    One2many,
    Many2one,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Char => "Char",
            FieldKind::Integer => "Integer",
            FieldKind::Float => "Float",
            FieldKind::Monetary => "Monetary",
            FieldKind::Date => "Date",
            FieldKind::Datetime => "Datetime",
            FieldKind::Boolean => "Boolean",
            FieldKind::Selection => "Selection",
            FieldKind::One2many => "One2many",
            FieldKind::Many2one => "Many2one",
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(self, FieldKind::One2many | FieldKind::Many2one)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families() {
        assert_eq!(datatype_family("positiveInteger"), Some(DatatypeFamily::Integer));
        assert_eq!(datatype_family("decimal"), Some(DatatypeFamily::Float));
        assert_eq!(datatype_family("base64Binary"), Some(DatatypeFamily::Char));
        assert_eq!(datatype_family("date"), Some(DatatypeFamily::Date));
        assert_eq!(datatype_family("dateTime"), Some(DatatypeFamily::Datetime));
        assert_eq!(datatype_family("boolean"), Some(DatatypeFamily::Boolean));
        assert_eq!(datatype_family("QName"), None);
    }

    #[test]
    fn test_field_kind_display() {
        assert_eq!(FieldKind::Many2one.to_string(), "Many2one");
        assert!(FieldKind::One2many.is_relational());
        assert!(!FieldKind::Selection.is_relational());
    }
}
