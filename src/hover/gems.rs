//! Hover for dependencies declared in a Gemfile
//!
//! `gem "rake"` shows the name, version and homepage of the gem. Metadata
//! comes from a [`GemCatalog`], filled from `Gemfile.lock` and from specs
//! registered by the host.

use crate::dispatch::{Dispatcher, Listener, ListenerContext, ListenerHandle};
use crate::error::ListenerResult;
use crate::parsing::ruby::names::node_text;
use crate::response::Category;
use crate::types::Range;
use dashmap::DashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;
use tree_sitter::Node;

const NO_DESCRIPTION: &str = "This rubygem does not have a description or summary.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemSpec {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
}

impl GemSpec {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    /// Description, else summary, else a fixed notice. Indentation left over
    /// from heredocs is stripped.
    pub fn info(&self) -> String {
        let text = [&self.description, &self.summary]
            .into_iter()
            .flatten()
            .map(|text| text.trim())
            .find(|text| !text.is_empty())
            .unwrap_or(NO_DESCRIPTION);
        text.lines()
            .map(str::trim_start)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Known gems by name.
#[derive(Debug, Default)]
pub struct GemCatalog {
    specs: DashMap<String, GemSpec>,
}

impl GemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the spec for `spec.name`.
    pub fn register(&self, spec: GemSpec) {
        self.specs.insert(spec.name.clone(), spec);
    }

    pub fn get(&self, name: &str) -> Option<GemSpec> {
        self.specs.get(name).map(|spec| spec.clone())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Records the locked version of every gem in a `Gemfile.lock`. Gems
    /// already known keep their other metadata. Returns how many were read.
    pub fn load_lockfile(&self, contents: &str) -> usize {
        let mut count = 0;
        for captures in contents.lines().filter_map(|line| lock_entry().captures(line)) {
            let (name, version) = (&captures[1], &captures[2]);
            self.specs
                .entry(name.to_string())
                .and_modify(|spec| spec.version = version.to_string())
                .or_insert_with(|| GemSpec::new(name, version));
            count += 1;
        }
        debug!("read {count} locked gems");
        count
    }
}

/// `    name (version)` lines of the `specs:` sections. Dependencies of a spec
/// are indented further and skipped.
fn lock_entry() -> &'static Regex {
    static ENTRY: OnceLock<Regex> = OnceLock::new();
    ENTRY.get_or_init(|| {
        Regex::new(r"^ {4}([A-Za-z0-9._-]+) \(([^)\s]+)\)$").expect("lockfile pattern is valid")
    })
}

/// Registers the dependency hover for Gemfiles. Other documents get nothing.
pub fn register_gemfile_listener<'a>(
    dispatcher: &mut Dispatcher<'a>,
    catalog: &'a GemCatalog,
) -> ListenerHandle {
    dispatcher.register(&["call"], GemfileListener { catalog })
}

pub struct GemfileListener<'a> {
    catalog: &'a GemCatalog,
}

impl GemfileListener<'_> {
    fn hover_dependency(&self, call: Node, context: &mut ListenerContext<'_>) {
        let Some(name) = dependency_name(call, context) else {
            return;
        };
        let Some(spec) = self.catalog.get(&name) else {
            debug!("no metadata for gem '{name}'");
            return;
        };

        context.push(Category::Title, format!("**{}** ({})", spec.name, spec.version));
        context.push(Category::Documentation, spec.info());
        if let Some(homepage) = spec.homepage.as_deref().filter(|url| !url.is_empty()) {
            context.push(Category::Links, format!("[{homepage}]({homepage})"));
        }
    }
}

impl Listener for GemfileListener<'_> {
    fn name(&self) -> &str {
        "gemfile"
    }

    fn enter(&mut self, node: Node<'_>, context: &mut ListenerContext<'_>) -> ListenerResult<()> {
        if context.document.is_gemfile() && is_gem_call(node, &context.document.source) {
            self.hover_dependency(node, context);
        }
        Ok(())
    }
}

/// A receiverless `gem ...` call.
pub fn is_gem_call(node: Node, source: &str) -> bool {
    node.kind() == "call"
        && node.child_by_field_name("receiver").is_none()
        && node
            .child_by_field_name("method")
            .is_some_and(|method| node_text(method, source) == "gem")
}

/// The gem named by `call`, when the position is on `gem` itself or on its
/// first argument and that argument is a plain string literal.
fn dependency_name(call: Node, context: &ListenerContext<'_>) -> Option<String> {
    let arguments = call.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let first = arguments
        .named_children(&mut cursor)
        .find(|argument| argument.kind() != "comment")?;

    if let Some(position) = context.position {
        let on_method = call
            .child_by_field_name("method")
            .is_some_and(|method| Range::from_node(&method).contains_position(position));
        if !on_method && !Range::from_node(&first).contains_position(position) {
            return None;
        }
    }

    plain_string(first, &context.document.source)
}

fn plain_string(node: Node, source: &str) -> Option<String> {
    if node.kind() != "string" || node.named_child_count() != 1 {
        return None;
    }
    let content = node.named_child(0)?;
    (content.kind() == "string_content").then(|| node_text(content, source).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCKFILE: &str = "\
GEM
  remote: https://rubygems.org/
  specs:
    rake (13.2.1)
    rubocop (1.66.1)
      json (~> 2.3)
      parallel (~> 1.10)
    nokogiri (1.16.7-x86_64-linux)

PLATFORMS
  x86_64-linux

DEPENDENCIES
  rake (~> 13.0)
  rubocop

BUNDLED WITH
   2.5.16
";

    #[test]
    fn test_lockfile_entries() {
        let catalog = GemCatalog::new();
        assert_eq!(catalog.load_lockfile(LOCKFILE), 3);

        assert_eq!(catalog.get("rake").unwrap().version, "13.2.1");
        assert_eq!(catalog.get("nokogiri").unwrap().version, "1.16.7-x86_64-linux");
        // Nested dependency constraints are not locked versions
        assert!(catalog.get("json").is_none());
    }

    #[test]
    fn test_lockfile_keeps_registered_metadata() {
        let catalog = GemCatalog::new();
        catalog.register(
            GemSpec::new("rake", "12.0.0").with_homepage("https://github.com/ruby/rake"),
        );
        catalog.load_lockfile(LOCKFILE);

        let rake = catalog.get("rake").unwrap();
        assert_eq!(rake.version, "13.2.1");
        assert_eq!(rake.homepage.as_deref(), Some("https://github.com/ruby/rake"));
    }

    #[test]
    fn test_info_prefers_description() {
        let spec = GemSpec::new("rake", "13.2.1")
            .with_summary("Make-like build tool")
            .with_description("  Rake is a Make-like program\n  implemented in Ruby.\n");
        assert_eq!(spec.info(), "Rake is a Make-like program\nimplemented in Ruby.");

        let spec = GemSpec::new("rake", "13.2.1").with_summary("Make-like build tool");
        assert_eq!(spec.info(), "Make-like build tool");

        let spec = GemSpec::new("rake", "13.2.1").with_description("   ");
        assert_eq!(spec.info(), NO_DESCRIPTION);
    }

    #[test]
    fn test_spec_from_json() {
        let spec: GemSpec =
            serde_json::from_str(r#"{"name": "rake", "version": "13.2.1"}"#).unwrap();
        assert_eq!(spec, GemSpec::new("rake", "13.2.1"));
    }
}
