use crate::types::Range;
use std::fmt;

/// Section of a hover response. Sections render in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Title,
    Documentation,
    Links,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Title, Category::Documentation, Category::Links];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Title => f.write_str("title"),
            Category::Documentation => f.write_str("documentation"),
            Category::Links => f.write_str("links"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Fragment {
    category: Category,
    text: String,
    source: Option<usize>,
}

/// Collects markdown fragments from every listener of one request.
///
/// Fragments are tagged with the node range they were pushed for. Content
/// for a strictly narrower node replaces everything collected for broader
/// nodes, and pushes for a broader node after that are dropped. Listeners
/// reacting to the same node add to each other.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuilder {
    fragments: Vec<Fragment>,
    anchor: Option<Range>,
    node_range: Option<Range>,
    source: Option<usize>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: Category, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }

        if let Some(range) = self.node_range {
            match self.anchor {
                None => self.anchor = Some(range),
                Some(anchor) if range.is_narrower_than(&anchor) => {
                    self.fragments.clear();
                    self.anchor = Some(range);
                }
                Some(anchor) if anchor.is_narrower_than(&range) => return,
                Some(_) => {}
            }
        }

        self.fragments.push(Fragment {
            category,
            text,
            source: self.source,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Fragments of `category`, in push order.
    pub fn fragments(&self, category: Category) -> impl Iterator<Item = &str> + '_ {
        self.fragments
            .iter()
            .filter(move |fragment| fragment.category == category)
            .map(|fragment| fragment.text.as_str())
    }

    /// Renders every category in order, fragments separated by a blank line.
    /// Returns an empty string when nothing was pushed.
    pub fn render(&self) -> String {
        let mut sections: Vec<String> = Vec::new();
        for category in Category::ALL {
            let section: Vec<&str> = self.fragments(category).collect();
            if !section.is_empty() {
                sections.push(section.join("\n\n"));
            }
        }
        sections.join("\n\n")
    }

    /// Range of the node whose listeners are about to push.
    pub(crate) fn set_node_range(&mut self, range: Option<Range>) {
        self.node_range = range;
    }

    /// Tags subsequent pushes with the registration that made them.
    pub(crate) fn set_source(&mut self, source: Option<usize>) {
        self.source = source;
    }

    /// Drops everything pushed by `source` during this request.
    pub(crate) fn discard_source(&mut self, source: usize) {
        self.fragments
            .retain(|fragment| fragment.source != Some(source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_orders_categories() {
        let mut builder = ResponseBuilder::new();
        builder.push(Category::Links, "links");
        builder.push(Category::Documentation, "docs");
        builder.push(Category::Title, "title");
        builder.push(Category::Documentation, "more docs");

        assert_eq!(builder.render(), "title\n\ndocs\n\nmore docs\n\nlinks");
        // Rendering does not consume anything
        assert_eq!(builder.render(), builder.render());
    }

    #[test]
    fn test_empty_builder_renders_nothing() {
        let mut builder = ResponseBuilder::new();
        builder.push(Category::Title, "");
        assert!(builder.is_empty());
        assert_eq!(builder.render(), "");
    }

    #[test]
    fn test_narrower_node_replaces_content() {
        let mut builder = ResponseBuilder::new();
        builder.set_node_range(Some(Range::new(0, 0, 0, 13)));
        builder.push(Category::Title, "Foo::Bar::Baz");

        builder.set_node_range(Some(Range::new(0, 0, 0, 3)));
        builder.push(Category::Title, "Foo");
        assert_eq!(builder.render(), "Foo");

        // Broader content after narrower content is ignored
        builder.set_node_range(Some(Range::new(0, 0, 0, 8)));
        builder.push(Category::Title, "Foo::Bar");
        assert_eq!(builder.render(), "Foo");
    }

    #[test]
    fn test_same_node_pushes_merge() {
        let mut builder = ResponseBuilder::new();
        builder.set_node_range(Some(Range::new(1, 2, 1, 5)));
        builder.push(Category::Title, "first");
        builder.push(Category::Documentation, "second");

        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_discard_source() {
        let mut builder = ResponseBuilder::new();
        builder.set_source(Some(0));
        builder.push(Category::Title, "kept");
        builder.set_source(Some(1));
        builder.push(Category::Documentation, "dropped");
        builder.discard_source(1);

        assert_eq!(builder.render(), "kept");
    }
}
