//! Markdown rendering of hover content.

use crate::declaration::{Declaration, ParameterKind, Signature};
use crate::types::DeclarationKind;

pub fn code_title(text: &str) -> String {
    format!("```ruby\n{text}\n```")
}

pub fn parameter_list(signature: &Signature) -> String {
    signature
        .parameters
        .iter()
        .map(|parameter| {
            let name = parameter.name.as_str();
            match parameter.kind {
                ParameterKind::Required => name.to_string(),
                ParameterKind::Optional => format!("{name} = <default>"),
                ParameterKind::Rest => format!("*{name}"),
                ParameterKind::Keyword => format!("{name}:"),
                ParameterKind::OptionalKeyword => format!("{name}: <default>"),
                ParameterKind::KeywordRest => format!("**{name}"),
                ParameterKind::Block => format!("&{name}"),
                ParameterKind::Forward => "...".to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `name(params)` for the first signature of the first method, plus a count
/// of that method's other signatures.
///
/// Overrides and same-named methods of other namespaces are separate
/// definitions, not overloads.
pub fn method_title(name: &str, declarations: &[Declaration]) -> String {
    let signatures: &[Signature] = declarations
        .iter()
        .find(|declaration| declaration.kind == DeclarationKind::Method)
        .map(|declaration| declaration.signatures.as_slice())
        .unwrap_or_default();

    let parameters = signatures
        .first()
        .map(|signature| parameter_list(signature))
        .unwrap_or_default();
    let mut title = format!("{name}({parameters})");

    let hidden = signatures.len().saturating_sub(1);
    if hidden > 0 {
        let noun = if hidden == 1 { "overload" } else { "overloads" };
        title.push_str(&format!(" (+{hidden} {noun})"));
    }
    code_title(&title)
}

/// Non-empty documentation of each declaration, in order.
pub fn documentation(declarations: &[Declaration]) -> Vec<&str> {
    declarations
        .iter()
        .map(|declaration| declaration.documentation.trim())
        .filter(|doc| !doc.is_empty())
        .collect()
}

/// `**Definitions**: [file.rb](uri#L1,1-2,4) | ...`, capped at `max` links.
pub fn definition_links(declarations: &[Declaration], max: usize) -> Option<String> {
    let links: Vec<String> = declarations
        .iter()
        .filter(|declaration| !declaration.uri.is_empty())
        .map(definition_link)
        .collect();
    if links.is_empty() {
        return None;
    }

    let shown = links.len().min(max.max(1));
    let mut text = format!("**Definitions**: {}", links[..shown].join(" | "));
    let remaining = links.len() - shown;
    if remaining > 0 {
        let noun = if remaining == 1 { "other" } else { "others" };
        text.push_str(&format!(" | {remaining} {noun}"));
    }
    Some(text)
}

fn definition_link(declaration: &Declaration) -> String {
    let uri = declaration.uri.as_str();
    let file = uri.rsplit('/').next().unwrap_or(uri);
    let range = declaration.range;
    format!(
        "[{file}]({uri}#L{},{}-{},{})",
        range.start_line + 1,
        range.start_column + 1,
        range.end_line + 1,
        range.end_column + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::Parameter;
    use crate::types::{DeclarationId, FileId, Range};

    fn method(signatures: usize) -> Declaration {
        let mut declaration = Declaration::new(
            DeclarationId::new(1).unwrap(),
            DeclarationKind::Method,
            "try_convert",
            FileId::new(1).unwrap(),
            Range::new(1, 0, 2, 3),
        )
        .with_uri("file:///core/string.rb");
        for _ in 0..signatures {
            declaration = declaration.with_signature(Signature::new(vec![Parameter::new(
                "object",
                ParameterKind::Required,
            )]));
        }
        declaration
    }

    #[test]
    fn test_parameter_list() {
        let signature = Signature::new(vec![
            Parameter::new("a", ParameterKind::Required),
            Parameter::new("b", ParameterKind::Optional),
            Parameter::new("c", ParameterKind::Rest),
            Parameter::new("d", ParameterKind::Keyword),
            Parameter::new("e", ParameterKind::OptionalKeyword),
            Parameter::new("f", ParameterKind::KeywordRest),
            Parameter::new("g", ParameterKind::Block),
        ]);
        assert_eq!(
            parameter_list(&signature),
            "a, b = <default>, *c, d:, e: <default>, **f, &g"
        );
    }

    #[test]
    fn test_overload_suffix() {
        assert_eq!(
            method_title("try_convert", &[method(3)]),
            "```ruby\ntry_convert(object) (+2 overloads)\n```"
        );
        assert_eq!(
            method_title("try_convert", &[method(2)]),
            "```ruby\ntry_convert(object) (+1 overload)\n```"
        );
        assert_eq!(
            method_title("try_convert", &[method(1)]),
            "```ruby\ntry_convert(object)\n```"
        );
    }

    #[test]
    fn test_separate_definitions_are_not_overloads() {
        let title = method_title("try_convert", &[method(1), method(1)]);
        assert_eq!(title, "```ruby\ntry_convert(object)\n```");

        let title = method_title("try_convert", &[method(2), method(1)]);
        assert_eq!(title, "```ruby\ntry_convert(object) (+1 overload)\n```");
    }

    #[test]
    fn test_definition_links_are_one_based() {
        let links = definition_links(&[method(1)], 10).unwrap();
        assert_eq!(
            links,
            "**Definitions**: [string.rb](file:///core/string.rb#L2,1-3,4)"
        );
    }

    #[test]
    fn test_definition_links_cap() {
        let declarations = vec![method(1), method(1), method(1), method(1)];
        let links = definition_links(&declarations, 2).unwrap();
        assert!(links.ends_with(" | 2 others"));
        assert_eq!(links.matches("string.rb#").count(), 2);
    }

    #[test]
    fn test_links_skip_declarations_without_uri() {
        let mut declaration = method(1);
        declaration.uri.clear();
        assert!(definition_links(&[declaration], 10).is_none());
    }
}
