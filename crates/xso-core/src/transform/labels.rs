//! Field labels and help texts extracted from schema documentation.
//!
//! XSD documentation is usually a full sentence. Odoo wants a short label
//! (`string`) and takes the rest as `help`. The heuristics below give good
//! labels for most fiscal schemas; a bad one can always be overridden in the
//! Odoo module.

use std::collections::HashSet;

use crate::config::LabelConfig;

use super::stopwords::stopwords;

/// Where to stop when extracting the beginning of a text.
pub const STRONG_PUNCTUATION: &[&str] = &[". ", ", ", " (", " - ", ".", ",", ": ", "|"];

/// Settings for [`extract_label`].
#[derive(Debug, Clone)]
pub struct LabelOptions {
    pub min_len: usize,
    pub max_len: usize,
    pub stopwords: Vec<String>,
    pub useless_starts: Vec<String>,
}

impl LabelOptions {
    pub fn from_config(config: &LabelConfig) -> Self {
        let stopwords = stopwords(config.language)
            .iter()
            .map(|w| w.to_string())
            .chain(config.stopwords.iter().cloned())
            .collect();
        Self {
            min_len: config.min_len,
            max_len: config.max_len,
            stopwords,
            useless_starts: config.useless_starts.clone(),
        }
    }

    /// Same options with another maximum label length.
    pub fn with_max_len(&self, max_len: usize) -> Self {
        Self {
            max_len,
            ..self.clone()
        }
    }
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self::from_config(&LabelConfig::default())
    }
}

/// A field label and the remaining help text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub string: String,
    pub help: Option<String>,
}

/// Labels already used by the fields of the class being rendered.
#[derive(Debug, Clone, Default)]
pub struct ClassRenderContext {
    pub used_labels: HashSet<String>,
}

impl ClassRenderContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Extract a short label and a help text from an attribute documentation.
///
/// The label never repeats one already in `used`; the returned label is
/// inserted into `used`.
pub fn extract_label(
    attr_name: &str,
    doc: Option<&str>,
    used: &mut HashSet<String>,
    options: &LabelOptions,
) -> Label {
    let mut string = attr_name.to_string();
    let mut help = None;

    if let Some(doc) = doc.map(str::trim).filter(|d| !d.is_empty()) {
        let doc = strip_useless_start(&doc.replace('"', ""), &options.useless_starts);

        let mut label = aggressive_cut(&doc, options.min_len);
        label = progressive_cut(label, options);

        if label.contains('(') && !label.contains(')') {
            label = label.split('(').next().unwrap_or_default().trim().to_string();
        }
        if label.is_empty() || char_len(&label) > options.max_len {
            label = attr_name.to_string();
        }

        if label != doc && drop_last_char(&doc) != label {
            help = Some(doc);
        }
        string = label;
    }

    if used.contains(&string) {
        string = format!("{string} ({attr_name})");
        if char_len(&string) > options.max_len {
            string = attr_name.to_string();
        }
        let mut n = 2;
        while used.contains(&string) {
            string = numbered(attr_name, n, options.max_len);
            n += 1;
        }
    }

    used.insert(string.clone());
    Label { string, help }
}

/// `{base} ({n})`, with `base` shortened so the whole fits in `max_len`.
fn numbered(base: &str, n: usize, max_len: usize) -> String {
    let suffix = format!(" ({n})");
    let room = max_len.saturating_sub(char_len(&suffix));
    let base: String = base.chars().take(room).collect();
    format!("{}{suffix}", base.trim_end())
}

fn strip_useless_start(doc: &str, starts: &[String]) -> String {
    let mut doc = doc.to_string();
    for start in starts {
        if doc.to_lowercase().starts_with(&start.to_lowercase()) {
            doc = doc.chars().skip(start.chars().count()).collect();
        }
    }
    doc
}

/// Cut at strong punctuation while the label is longer than `min_len`.
fn aggressive_cut(doc: &str, min_len: usize) -> String {
    let first_line = doc.lines().next().unwrap_or_default();
    let mut string = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    for token in STRONG_PUNCTUATION {
        while let Some(pos) = string.rfind(token) {
            if char_len(&string) > min_len {
                string.truncate(pos);
            } else {
                break;
            }
        }
    }

    string
}

/// Cut after the rightmost stopword until the label fits in `max_len`, then
/// drop dangling punctuation and stopwords at the end.
fn progressive_cut(mut string: String, options: &LabelOptions) -> String {
    let tokens: Vec<String> = options.stopwords.iter().map(|w| format!(" {w} ")).collect();

    while char_len(&string) > options.max_len {
        let cut = tokens
            .iter()
            .filter_map(|t| string.rfind(t.as_str()))
            .filter(|pos| *pos > 0)
            .max();
        match cut {
            Some(pos) => string.truncate(pos),
            None => break,
        }
    }

    let endings: Vec<&str> = STRONG_PUNCTUATION
        .iter()
        .copied()
        .chain(tokens.iter().map(String::as_str))
        .map(str::trim_end)
        .collect();

    while let Some(ending) = endings.iter().find(|e| string.ends_with(**e)) {
        string.truncate(string.len() - ending.len());
        string.truncate(string.trim_end().len());
    }

    string
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn drop_last_char(s: &str) -> &str {
    match s.char_indices().last() {
        Some((pos, _)) => &s[..pos],
        None => s,
    }
}
