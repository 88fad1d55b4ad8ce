//! Ruby parser wrapper
//!
//! Wraps the tree-sitter Ruby grammar and bundles every parse with its source
//! text and strictness sigil, which is all the index and the dispatcher need.
//!
//! ERB templates are parsed twice: the embedded-template grammar finds the
//! `<% %>` code regions, then the Ruby grammar parses a copy of the template
//! with everything else blanked out. Positions in the resulting tree are
//! positions in the template itself.
//!
//! **Tree-sitter ABI Version**: ABI-14 (tree-sitter-ruby 0.23.1)

use crate::error::{ParseError, ParseResult};
use crate::parsing::sigil::{self, Strictness};
use std::ops::Range;
use tree_sitter::{Language, Node, Parser, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentLanguage {
    Ruby,
    /// Ruby embedded in a template (`.erb`)
    Erb,
}

impl DocumentLanguage {
    pub fn from_uri(uri: &str) -> Self {
        if uri.ends_with(".erb") {
            DocumentLanguage::Erb
        } else {
            DocumentLanguage::Ruby
        }
    }
}

/// One parsed file. The tree borrows nothing, so documents can be stored
/// and re-dispatched across requests.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub uri: String,
    /// Text the tree was parsed from. For templates this is the Ruby view:
    /// markup blanked out, every position unchanged.
    pub source: String,
    pub tree: Tree,
    pub strictness: Strictness,
    pub language: DocumentLanguage,
}

impl ParsedDocument {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// True for Bundler's `Gemfile`, where `gem` calls declare dependencies.
    pub fn is_gemfile(&self) -> bool {
        self.uri.rsplit('/').next() == Some("Gemfile")
    }
}

pub struct RubyParser {
    parser: Parser,
    template: Parser,
}

impl std::fmt::Debug for RubyParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RubyParser")
            .field("language", &"Ruby")
            .field("templates", &"ERB")
            .finish()
    }
}

fn parser_for(language: Language, name: &str) -> ParseResult<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::ParserInit {
            language: name.to_string(),
            reason: format!("tree-sitter error: {e}"),
        })?;
    Ok(parser)
}

impl RubyParser {
    pub fn new() -> ParseResult<Self> {
        Ok(Self {
            parser: parser_for(tree_sitter_ruby::LANGUAGE.into(), "Ruby")?,
            template: parser_for(tree_sitter_embedded_template::LANGUAGE.into(), "ERB")?,
        })
    }

    /// Parses `source`. Syntax errors do not fail the parse; they show up
    /// as `ERROR` nodes that extraction skips.
    pub fn parse(&mut self, uri: &str, source: &str) -> ParseResult<ParsedDocument> {
        let language = DocumentLanguage::from_uri(uri);
        let (source, tree, strictness) = match language {
            DocumentLanguage::Ruby => (
                source.to_string(),
                self.parse_ruby(uri, source)?,
                sigil::detect(source).unwrap_or_default(),
            ),
            DocumentLanguage::Erb => {
                let (ruby, tree) = self.parse_erb(uri, source)?;
                (ruby, tree, Strictness::default())
            }
        };

        Ok(ParsedDocument {
            uri: uri.to_string(),
            source,
            tree,
            strictness,
            language,
        })
    }

    fn parse_ruby(&mut self, uri: &str, source: &str) -> ParseResult<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| ParseError::NoTree {
                uri: uri.to_string(),
            })
    }

    fn parse_erb(&mut self, uri: &str, source: &str) -> ParseResult<(String, Tree)> {
        let template = self
            .template
            .parse(source, None)
            .ok_or_else(|| ParseError::NoTree {
                uri: uri.to_string(),
            })?;
        let ruby = ruby_view(source, &code_ranges(template.root_node())).map_err(|reason| {
            ParseError::Template {
                uri: uri.to_string(),
                reason,
            }
        })?;
        let tree = self.parse_ruby(uri, &ruby)?;
        Ok((ruby, tree))
    }
}

/// Byte ranges of the Ruby code inside `<% %>` and `<%= %>` tags, in order.
/// Comment tags are skipped.
fn code_ranges(root: Node) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut cursor = root.walk();
    for directive in root.named_children(&mut cursor) {
        if !matches!(directive.kind(), "directive" | "output_directive") {
            continue;
        }
        let mut inner = directive.walk();
        ranges.extend(
            directive
                .named_children(&mut inner)
                .filter(|child| child.kind() == "code")
                .map(|code| code.byte_range()),
        );
    }
    ranges
}

/// The template with everything but `ranges` blanked to spaces. Newlines are
/// kept and each closing tag becomes `;`, so every byte keeps its position
/// and adjacent tags stay separate statements.
fn ruby_view(source: &str, ranges: &[Range<usize>]) -> Result<String, String> {
    let bytes = source.as_bytes();
    let mut ruby: Vec<u8> = bytes
        .iter()
        .map(|&byte| if byte == b'\n' { byte } else { b' ' })
        .collect();

    for range in ranges {
        let Some(code) = bytes.get(range.clone()) else {
            return Err(format!("code range {range:?} is out of bounds"));
        };
        ruby[range.clone()].copy_from_slice(code);
        if matches!(bytes.get(range.end), Some(b'%' | b'-' | b'_')) {
            ruby[range.end] = b';';
        }
    }

    String::from_utf8(ruby).map_err(|e| format!("code range splits a character: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_sigil() {
        let mut parser = RubyParser::new().unwrap();
        let doc = parser
            .parse("file:///a.rb", "# typed: strict\nclass A; end\n")
            .unwrap();

        assert_eq!(doc.strictness, Strictness::Strict);
        assert_eq!(doc.language, DocumentLanguage::Ruby);
        assert_eq!(doc.root().kind(), "program");
        assert!(!doc.has_errors());
    }

    #[test]
    fn test_parse_without_sigil_defaults_to_false() {
        let mut parser = RubyParser::new().unwrap();
        let doc = parser.parse("file:///b.rb", "def foo(\n").unwrap();

        assert_eq!(doc.strictness, Strictness::False);
        assert!(doc.has_errors());
    }

    #[test]
    fn test_erb_parses_only_embedded_ruby() {
        let mut parser = RubyParser::new().unwrap();
        let source = "<h1><%= title %></h1>\n<%# note %>\n<% String %>\n";
        let doc = parser.parse("file:///views/show.html.erb", source).unwrap();

        assert_eq!(doc.language, DocumentLanguage::Erb);
        assert!(!doc.has_errors());

        let string = doc
            .root()
            .descendant_for_point_range(
                tree_sitter::Point::new(2, 3),
                tree_sitter::Point::new(2, 3),
            )
            .unwrap();
        assert_eq!(string.kind(), "constant");
        assert_eq!(&doc.source[string.byte_range()], "String");
    }

    #[test]
    fn test_ruby_view_keeps_positions() {
        let source = "<ul>\n<% items.each do |item| %><li><%= item %></li><% end %>\n</ul>\n";
        let mut parser = RubyParser::new().unwrap();
        let doc = parser.parse("file:///list.erb", source).unwrap();

        assert_eq!(doc.source.len(), source.len());
        assert_eq!(doc.source.lines().count(), source.lines().count());
        assert!(doc.source.contains(" items.each do |item| ;"));
        assert!(!doc.source.contains("<li>"));
        assert!(!doc.has_errors());
    }

    #[test]
    fn test_adjacent_tags_stay_separate_statements() {
        let mut parser = RubyParser::new().unwrap();
        let doc = parser.parse("file:///a.erb", "<% foo %><% bar %>\n").unwrap();
        // Two bare identifiers, not `foo(bar)`
        assert_eq!(doc.root().named_child_count(), 2);
    }

    #[test]
    fn test_erb_without_code() {
        let mut parser = RubyParser::new().unwrap();
        let doc = parser.parse("file:///a.erb", "<p>static</p>\n").unwrap();
        assert_eq!(doc.root().named_child_count(), 0);
    }

    #[test]
    fn test_gemfile_detection() {
        let mut parser = RubyParser::new().unwrap();
        assert!(parser.parse("file:///app/Gemfile", "").unwrap().is_gemfile());
        assert!(!parser.parse("file:///app/Gemfile.rb", "").unwrap().is_gemfile());
    }
}
