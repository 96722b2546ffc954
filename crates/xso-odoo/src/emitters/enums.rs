use std::collections::HashSet;

use xso_core::ir::SchemaClass;
use xso_core::transform::labels::extract_label;

use crate::context::GenerationContext;

/// Separators between a value and its meaning in field documentation,
/// e.g. `1 - Normal; 2 - Contingência`.
const ITEM_SEPARATORS: &[&str] = &[" - ", "-", " – ", "–"];

/// Enumeration help texts are not shortened like field labels.
const ENUM_HELP_MAX_LEN: usize = 1024;

/// One `(value, label)` pair of a selection constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumItem {
    pub value: String,
    pub label: String,
}

/// Values of an enumeration with their labels, and the enumeration help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDoc {
    pub items: Vec<EnumItem>,
    pub help: Option<String>,
}

/// Values kept in a selection: case-insensitive duplicates are dropped
/// since Postgres would reject them.
pub fn enum_skip<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.to_lowercase()))
        .collect()
}

/// Text after the first `token` of `text`, up to the next `token`, and the
/// text before it.
fn split_at_token<'t>(text: &'t str, token: &str) -> Option<(&'t str, &'t str)> {
    let pos = text.find(token)?;
    let before = &text[..pos];
    let rest = &text[pos + token.len()..];
    let segment = rest.find(token).map_or(rest, |end| &rest[..end]);
    Some((before, segment))
}

/// Labels and help of an enumeration.
///
/// Fiscal schemas name enumerations of a single field `Type_field` and
/// describe the values in the documentation of that field
/// (`A - Ativo; B - Baixado`). Item labels are read from there; values
/// without a description are labelled with themselves.
pub fn enum_doc(ctx: &GenerationContext, class: &SchemaClass) -> EnumDoc {
    let mut help = ctx.xsd_info.documentation(class).map(str::to_string);
    let mut items: Vec<EnumItem> = class
        .values
        .iter()
        .map(|v| EnumItem {
            value: v.value.clone(),
            label: v.documentation.clone().unwrap_or_else(|| v.value.clone()),
        })
        .collect();

    let field_doc = class.name.split_once('_').and_then(|(_, rest)| {
        let field_name = rest.split('_').next().unwrap_or(rest);
        let type_qname = class.qname.split('_').next()?;
        let owner = ctx.forest.resolve(type_qname).filter(|c| c.is_complex())?;
        owner
            .attributes
            .iter()
            .find(|a| a.name == field_name)
            .and_then(|a| a.documentation.as_deref())
    });

    let Some(field_doc) = field_doc else {
        return EnumDoc { items, help };
    };

    for (idx, item) in items.iter_mut().enumerate() {
        let found = ITEM_SEPARATORS
            .iter()
            .find_map(|sep| split_at_token(field_doc, &format!("{}{sep}", item.value)));

        let item_help = found
            .map(|(_, after)| {
                let line = after.lines().next().unwrap_or_default();
                line.split(';').next().unwrap_or_default().trim()
            })
            .filter(|h| !h.is_empty());

        match item_help {
            Some(item_help) => {
                item.label = item_help.to_string();
                if idx == 0
                    && let Some((before, _)) = found
                    && !before.trim().is_empty()
                {
                    let label = extract_label(
                        &class.name,
                        Some(before),
                        &mut HashSet::new(),
                        &ctx.labels.with_max_len(ENUM_HELP_MAX_LEN),
                    );
                    help = Some(label.string);
                }
            }
            None => item.label = item.value.clone(),
        }

        if idx == 0 && help.is_none() && !field_doc.starts_with(&item.value) {
            help = Some(field_doc.to_string());
        }
    }

    EnumDoc { items, help }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_skip() {
        assert_eq!(enum_skip(["Brasil", "BRASIL", "Argentina"]), vec!["Brasil", "Argentina"]);
        assert_eq!(enum_skip(["1", "2"]), vec!["1", "2"]);
    }

    #[test]
    fn test_split_at_token() {
        assert_eq!(
            split_at_token("A - Ativo; B - Baixado", "B - "),
            Some(("A - Ativo; ", "Baixado"))
        );
        assert_eq!(
            split_at_token("0 - Normal\n1 - Retificadora", "0 - "),
            Some(("", "Normal\n1 - Retificadora"))
        );
        assert_eq!(split_at_token("Normal", "1 - "), None);
    }
}
