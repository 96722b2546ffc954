//! Monetary vs Float detection from numeric xsd type names.
//!
//! Fiscal schemas name their decimal types after their precision, e.g.
//! `TDec_1302` for 13 integer and 2 decimal digits. The convention string
//! `TDec_[5:7.7:9]` says: types starting with `TDec_` carry the integer
//! digits at characters 5..7 and the decimal digits at 7..9.

use std::ops::Range;

use crate::config::NumericConfig;
use crate::error::ConfigError;

/// Digits encoded in a numeric type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericDigits {
    pub integer: u32,
    pub decimal: u32,
}

/// Precision used when a numeric type name carries no digits.
pub const DEFAULT_DIGITS: NumericDigits = NumericDigits {
    integer: 16,
    decimal: 4,
};

/// A naming convention for numeric xsd types.
pub trait NumericConvention: std::fmt::Debug {
    /// Whether `xsd_type` is a numeric type under this convention.
    fn matches(&self, xsd_type: &str) -> bool;

    /// Digits encoded in the type name, `None` if the convention encodes
    /// none or they cannot be read.
    fn digits(&self, xsd_type: &str) -> Option<NumericDigits>;

    /// Whether the convention encodes digits at all.
    fn encodes_digits(&self) -> bool;
}

/// Types matched by prefix only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixConvention {
    pub prefix: String,
}

impl NumericConvention for PrefixConvention {
    fn matches(&self, xsd_type: &str) -> bool {
        xsd_type.starts_with(&self.prefix)
    }

    fn digits(&self, _xsd_type: &str) -> Option<NumericDigits> {
        None
    }

    fn encodes_digits(&self) -> bool {
        false
    }
}

/// Types matched by prefix, digits read from fixed character slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketSliceConvention {
    pub prefix: String,
    pub integer: Range<usize>,
    pub decimal: Range<usize>,
}

impl BracketSliceConvention {
    /// Parse `Prefix[int_start:int_stop.dec_start:dec_stop]`.
    pub fn parse(convention: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidNumericConvention(convention.to_string());

        let (prefix, rest) = convention.split_once('[').ok_or_else(invalid)?;
        let inner = rest.strip_suffix(']').ok_or_else(invalid)?;
        let (int_part, dec_part) = inner.split_once('.').ok_or_else(invalid)?;

        let range = |part: &str| -> Result<Range<usize>, ConfigError> {
            let (start, stop) = part.split_once(':').ok_or_else(invalid)?;
            let start: usize = start.trim().parse().map_err(|_| invalid())?;
            let stop: usize = stop.trim().parse().map_err(|_| invalid())?;
            if start >= stop {
                return Err(invalid());
            }
            Ok(start..stop)
        };

        Ok(Self {
            prefix: prefix.to_string(),
            integer: range(int_part)?,
            decimal: range(dec_part)?,
        })
    }
}

impl NumericConvention for BracketSliceConvention {
    fn matches(&self, xsd_type: &str) -> bool {
        xsd_type.starts_with(&self.prefix)
    }

    fn digits(&self, xsd_type: &str) -> Option<NumericDigits> {
        let normalized = strip_version_markers(xsd_type);
        let read = |range: &Range<usize>| -> Option<u32> {
            normalized.get(range.clone())?.parse().ok()
        };
        Some(NumericDigits {
            integer: read(&self.integer)?,
            decimal: read(&self.decimal)?,
        })
    }

    fn encodes_digits(&self) -> bool {
        true
    }
}

/// `TDec_0803v` style names mark a variant with a `v` after the digits.
fn strip_version_markers(xsd_type: &str) -> String {
    let mut out = String::with_capacity(xsd_type.len());
    let mut prev_digit = false;
    for c in xsd_type.chars() {
        if c == 'v' && prev_digit {
            prev_digit = false;
            continue;
        }
        prev_digit = c.is_ascii_digit();
        out.push(c);
    }
    out
}

/// Build the convention described by a configuration string.
pub fn parse_convention(convention: &str) -> Result<Box<dyn NumericConvention>, ConfigError> {
    if convention.contains('[') {
        Ok(Box::new(BracketSliceConvention::parse(convention)?))
    } else {
        Ok(Box::new(PrefixConvention {
            prefix: convention.to_string(),
        }))
    }
}

/// Outcome of the numeric detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Monetary,
    Float(NumericDigits),
}

/// Decides between Monetary and Float for numeric xsd types.
#[derive(Debug)]
pub struct NumericClassifier {
    convention: Box<dyn NumericConvention>,
    monetary_type: Option<String>,
    monetary_digits: u32,
}

impl NumericClassifier {
    pub fn new(
        convention: Box<dyn NumericConvention>,
        monetary_type: Option<String>,
        monetary_digits: u32,
    ) -> Self {
        Self {
            convention,
            monetary_type,
            monetary_digits,
        }
    }

    pub fn from_config(config: &NumericConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            parse_convention(&config.num_type)?,
            config.monetary_type.clone(),
            config.monetary_digits,
        ))
    }

    /// Classify an attribute given its raw xsd type. `None` means the type
    /// follows no numeric convention.
    pub fn classify(&self, attr_name: &str, xsd_type: &str) -> Option<NumericKind> {
        if let Some(monetary) = &self.monetary_type
            && xsd_type.starts_with(monetary.as_str())
        {
            return Some(NumericKind::Monetary);
        }
        if !self.convention.matches(xsd_type) {
            return None;
        }
        if !self.convention.encodes_digits() {
            return Some(NumericKind::Float(DEFAULT_DIGITS));
        }

        let digits = self.convention.digits(xsd_type)?;
        if digits.decimal != self.monetary_digits || is_percentage(attr_name) {
            Some(NumericKind::Float(digits))
        } else {
            Some(NumericKind::Monetary)
        }
    }
}

/// `pICMS`, `pRedBC`: a `p` followed by an uppercase letter is a percentage.
pub fn is_percentage(attr_name: &str) -> bool {
    let mut chars = attr_name.chars();
    chars.next() == Some('p') && chars.next().is_some_and(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> NumericClassifier {
        NumericClassifier::from_config(&NumericConfig::default()).unwrap()
    }

    #[test]
    fn parses_bracket_convention() {
        let c = BracketSliceConvention::parse("TDec_[5:7.7:9]").unwrap();
        assert_eq!(c.prefix, "TDec_");
        assert_eq!(c.integer, 5..7);
        assert_eq!(c.decimal, 7..9);
        assert!(BracketSliceConvention::parse("TDec_[5:7]").is_err());
        assert!(BracketSliceConvention::parse("TDec_[7:5.7:9]").is_err());
    }

    #[test]
    fn non_monetary_decimals_are_float() {
        assert_eq!(
            classifier().classify("qCom", "TDec_1604"),
            Some(NumericKind::Float(NumericDigits {
                integer: 16,
                decimal: 4
            }))
        );
    }

    #[test]
    fn two_decimals_are_monetary() {
        assert_eq!(
            classifier().classify("vProd", "TDec_1002"),
            Some(NumericKind::Monetary)
        );
    }

    #[test]
    fn percentages_stay_float() {
        assert_eq!(
            classifier().classify("pICMS", "TDec_0302"),
            Some(NumericKind::Float(NumericDigits {
                integer: 3,
                decimal: 2
            }))
        );
        assert!(!is_percentage("placa"));
        assert!(!is_percentage("p"));
    }

    #[test]
    fn version_markers_are_ignored() {
        assert_eq!(
            classifier().classify("vUnCom", "TDec_1110v"),
            Some(NumericKind::Float(NumericDigits {
                integer: 11,
                decimal: 10
            }))
        );
    }

    #[test]
    fn other_types_are_not_numeric() {
        assert_eq!(classifier().classify("xNome", "TString"), None);
        assert_eq!(classifier().classify("vProd", "TDec_"), None);
    }

    #[test]
    fn monetary_type_wins() {
        let c = NumericClassifier::new(
            parse_convention("TDec").unwrap(),
            Some("TMoney".to_string()),
            2,
        );
        assert_eq!(c.classify("vProd", "TMoney15"), Some(NumericKind::Monetary));
        assert_eq!(
            c.classify("vProd", "TDec_1302"),
            Some(NumericKind::Float(DEFAULT_DIGITS))
        );
    }
}
