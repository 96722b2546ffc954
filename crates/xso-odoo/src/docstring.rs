//! Python docstrings from schema documentation.

/// Wrap `text` into a quoted Python string literal spread over several
/// lines, continuation lines indented by `indent` spaces.
///
/// The literal is triple-quoted when it does not fit on one line, spans
/// several lines or contains double quotes.
pub fn wrap_text(text: &str, indent: usize, width: usize) -> String {
    const INITIAL_INDENT: usize = 4;

    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    let quote = if text.chars().count() + INITIAL_INDENT + 8 > width
        || text.contains('\n')
        || text.contains('"')
    {
        "\"\"\""
    } else {
        "\""
    };
    let open = if text.starts_with('"') { format!("{quote} ") } else { quote.to_string() };
    let close = if text.ends_with('"') { format!(" {quote}") } else { quote.to_string() };
    let quoted = format!("{open}{text}{close}");

    let mut wrapped: Vec<String> = Vec::new();
    for (i, line) in quoted.lines().enumerate() {
        let first_width = if i == 0 { width - INITIAL_INDENT } else { width };
        wrapped.extend(fill(line, first_width, first_width.saturating_sub(indent)));
    }
    wrapped.join(&format!("\n{}", " ".repeat(indent)))
}

/// Greedy word wrap. The first line holds `first_width` characters, the
/// following ones `width`. Words longer than a line are kept whole.
fn fill(line: &str, first_width: usize, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut limit = first_width;
    for word in line.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > limit && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            limit = width;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Class docstring as it sits in a class body, empty without documentation.
pub fn clean_docstring(doc: Option<&str>) -> String {
    doc.map(|d| wrap_text(d, 4, 79)).unwrap_or_default()
}

/// The `_description` expression of a model.
pub fn class_description(name: &str, has_docstring: bool) -> String {
    if has_docstring {
        r#"textwrap.dedent("    %s" % (__doc__,))"#.to_string()
    } else {
        format!("\"{}\"", crate::kwargs::escape_str(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_uses_simple_quotes() {
        assert_eq!(wrap_text("Grupo do emitente", 4, 79), "\"Grupo do emitente\"");
    }

    #[test]
    fn long_text_is_wrapped_in_triple_quotes() {
        let text = "Informações de interesse do contribuinte, conforme legislação. \
                    Norma referenciada, informações complementares, etc";
        let wrapped = wrap_text(text, 4, 79);
        assert!(wrapped.starts_with("\"\"\"Informações"));
        assert!(wrapped.ends_with("etc\"\"\""));
        for (i, line) in wrapped.lines().enumerate() {
            let limit = if i == 0 { 75 } else { 79 };
            assert!(line.chars().count() <= limit, "{line:?}");
            if i > 0 {
                assert!(line.starts_with("    "));
            }
        }
    }

    #[test]
    fn quotes_force_triple_quotes() {
        assert_eq!(wrap_text("Tag \"raiz\"", 4, 79), "\"\"\"Tag \"raiz\" \"\"\"");
    }

    #[test]
    fn multi_line_text_keeps_lines() {
        assert_eq!(
            wrap_text("Primeira linha\nSegunda linha", 4, 79),
            "\"\"\"Primeira linha\n    Segunda linha\"\"\""
        );
    }

    #[test]
    fn descriptions() {
        assert_eq!(class_description("TNFe", false), "\"TNFe\"");
        assert_eq!(
            class_description("TNFe", true),
            "textwrap.dedent(\"    %s\" % (__doc__,))"
        );
        assert_eq!(clean_docstring(None), "");
    }
}
