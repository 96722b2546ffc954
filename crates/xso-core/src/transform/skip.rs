use regex::Regex;

use crate::error::ConfigError;

/// XML digital signature boilerplate that is rarely worth a model.
pub const SIGNATURE_CLASS_SKIP: &[&str] = &[
    "^Signature$",
    "^SignatureType$",
    "^SignatureValueType$",
    "^SignedInfoType$",
    "^ReferenceType$",
    "^DigestMethodType$",
    "^TransformsType$",
    "^TransformType$",
    "^KeyInfoType$",
    "^X509DataType$",
    "^CanonicalizationMethodType$",
    "^SignatureMethodType$",
];

#[derive(Debug, Clone)]
struct SkipPattern {
    regex: Regex,
    /// Number of dotted segments the pattern spans.
    parts: usize,
}

/// Compiled skip patterns for classes and fields.
#[derive(Debug, Clone)]
pub struct SkipPatterns {
    patterns: Vec<SkipPattern>,
}

impl SkipPatterns {
    /// The signature defaults followed by `extra`.
    pub fn new(extra: &[String]) -> Result<Self, ConfigError> {
        let sources = SIGNATURE_CLASS_SKIP
            .iter()
            .map(|s| s.to_string())
            .chain(extra.iter().cloned());

        let patterns = sources
            .map(|pattern| {
                let regex = Regex::new(&pattern).map_err(|source| {
                    ConfigError::InvalidSkipPattern {
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
                Ok(SkipPattern {
                    parts: pattern.matches('.').count() + 1,
                    regex,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { patterns })
    }

    /// Whether a class or field called `name` should be skipped.
    ///
    /// `parents` are the local names of the enclosing classes, outermost
    /// first. Dotted patterns such as `TNFe.infNFe.autXML` are matched
    /// against the trailing parents, with and without `name`.
    pub fn matches(&self, name: &str, parents: &[&str]) -> bool {
        self.patterns.iter().any(|p| {
            if p.regex.is_match(name) {
                return true;
            }
            if p.parts < 2 {
                return false;
            }

            let scoped = tail(parents, p.parts).join(".");
            if p.regex.is_match(&scoped) {
                return true;
            }

            let mut field_scoped = tail(parents, p.parts - 1).to_vec();
            field_scoped.push(name);
            p.regex.is_match(&field_scoped.join("."))
        })
    }
}

impl Default for SkipPatterns {
    fn default() -> Self {
        // The built-in patterns are valid regexes.
        Self::new(&[]).unwrap_or(Self {
            patterns: Vec::new(),
        })
    }
}

fn tail<'a, 'b>(items: &'a [&'b str], n: usize) -> &'a [&'b str] {
    &items[items.len().saturating_sub(n)..]
}
