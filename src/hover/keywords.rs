//! Ruby keywords and their short descriptions.

/// Reserved words of the language.
pub const KEYWORDS: &[&str] = &[
    "BEGIN", "END", "__ENCODING__", "__FILE__", "__LINE__", "alias", "and", "begin", "break",
    "case", "class", "def", "defined?", "do", "else", "elsif", "end", "ensure", "false", "for",
    "if", "in", "module", "next", "nil", "not", "or", "redo", "rescue", "retry", "return", "self",
    "super", "then", "true", "undef", "unless", "until", "when", "while", "yield",
];

/// Named nodes that are keywords themselves or carry keyword tokens.
pub const KEYWORD_NODE_KINDS: &[&str] = &[
    "alias",
    "begin",
    "begin_block",
    "binary",
    "break",
    "case",
    "case_match",
    "class",
    "do",
    "do_block",
    "else",
    "elsif",
    "end_block",
    "ensure",
    "false",
    "for",
    "if",
    "if_modifier",
    "in",
    "in_clause",
    "method",
    "module",
    "next",
    "nil",
    "redo",
    "rescue",
    "rescue_modifier",
    "retry",
    "return",
    "self",
    "singleton_class",
    "singleton_method",
    "then",
    "true",
    "unary",
    "undef",
    "unless",
    "unless_modifier",
    "until",
    "until_modifier",
    "when",
    "while",
    "while_modifier",
    "yield",
];

const DOCUMENTATION: &[(&str, &str)] = &[
    ("BEGIN", "Registers code to run before the rest of the program."),
    ("END", "Registers code to run after the rest of the program."),
    ("alias", "Gives an existing method or global variable another name."),
    ("and", "Low precedence logical and. Evaluates the right side only when the left side is truthy."),
    ("begin", "Starts a block of code that can handle exceptions with `rescue` and `ensure`."),
    ("break", "Leaves the innermost loop or block. A value passed to it becomes the result of the loop or of the method that yielded."),
    ("case", "Compares a value against `when` or `in` clauses and runs the first one that matches."),
    ("class", "Defines or reopens a class."),
    ("def", "Defines a method."),
    ("defined?", "Returns a description of its argument, or `nil` when the argument is not defined."),
    ("do", "Starts a block, or the body of a loop."),
    ("else", "Runs when no previous branch matched, or when a `begin` body raised nothing."),
    ("elsif", "Adds another condition to an `if` expression."),
    ("end", "Closes a definition, block or control structure."),
    ("ensure", "Runs whether or not the surrounding code raised an exception."),
    ("false", "The only instance of `FalseClass`."),
    ("for", "Iterates over the elements of an enumerable. Unlike a block, the loop variable remains visible after the loop."),
    ("if", "Runs the code that follows when the condition is truthy."),
    ("in", "A pattern matching clause of a `case` expression, or the collection of a `for` loop."),
    ("module", "Defines or reopens a module."),
    ("next", "Skips to the next iteration of a loop or ends the current block call. A value passed to it becomes the block result."),
    ("nil", "The only instance of `NilClass`, representing the absence of a value."),
    ("not", "Low precedence logical negation."),
    ("or", "Low precedence logical or. Evaluates the right side only when the left side is falsy."),
    ("redo", "Restarts the current iteration of a loop or block without checking the condition."),
    ("rescue", "Handles exceptions raised by the preceding code."),
    ("retry", "Runs the `begin` block again from the start, from inside a `rescue` clause."),
    ("return", "Leaves the current method, returning the given value."),
    ("self", "The object the current code is running on."),
    ("super", "Calls the method of the same name further up the ancestor chain."),
    ("then", "Separates a condition from the code it guards."),
    ("true", "The only instance of `TrueClass`."),
    ("undef", "Removes a method definition from the current class."),
    ("unless", "Runs the code that follows when the condition is falsy."),
    ("until", "Repeats the loop body while the condition is falsy."),
    ("when", "A clause of a `case` expression, matched with `===`."),
    ("while", "Repeats the loop body while the condition is truthy."),
    ("yield", "Calls the block passed to the current method with the given arguments and returns the block result."),
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

pub fn documentation(keyword: &str) -> Option<&'static str> {
    DOCUMENTATION
        .iter()
        .find(|(name, _)| *name == keyword)
        .map(|(_, doc)| *doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_documented_entry_is_a_keyword() {
        for (keyword, _) in DOCUMENTATION {
            assert!(is_keyword(keyword), "{keyword} is not a keyword");
        }
    }

    #[test]
    fn test_lookup() {
        assert!(documentation("yield").is_some());
        assert!(documentation("__FILE__").is_none());
        assert!(!is_keyword("puts"));
    }
}
