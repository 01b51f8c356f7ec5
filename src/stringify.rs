use crate::error::Error;
use crate::types::{AssertionType, ClassKind, Node, RootNode};

/// The rendered form of a root: pattern source text plus the canonical flag
/// string. Compiling `source` with `flags` in the native engine matches
/// exactly what the node tree denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub source: String,
    pub flags: String,
}

/// Render a root wrapper to pattern source and flags.
///
/// Grouping is decided at every composition boundary: a fragment is wrapped
/// in `(?:...)` exactly when rendering it bare would change what the
/// surrounding syntax binds to.
pub fn stringify(root: &RootNode) -> Result<Compiled, Error> {
    log::debug!("stringify({root:?})");

    let mut source = String::new();
    if root.anchor_start {
        source.push('^');
    }
    // `|` binds looser than anchors: ^a|b$ would anchor only the outer
    // branches, so an alternation body under an anchor is grouped
    if (root.anchor_start || root.anchor_end) && matches!(root.node, Node::Choice(_)) {
        source.push_str("(?:");
        render(&root.node, &mut source)?;
        source.push(')');
    } else {
        render(&root.node, &mut source)?;
    }
    if root.anchor_end {
        source.push('$');
    }

    Ok(Compiled {
        source,
        flags: root.flags.to_string(),
    })
}

fn render(node: &Node, out: &mut String) -> Result<(), Error> {
    match node {
        Node::Empty => {}
        Node::Literal { text, .. } => out.push_str(text),
        Node::Sequence(nodes) => {
            for node in nodes {
                // Concatenation binds tighter than `|`, keep branch sets whole
                if matches!(node, Node::Choice(_)) {
                    out.push_str("(?:");
                    render(node, out)?;
                    out.push(')');
                } else {
                    render(node, out)?;
                }
            }
        }
        Node::Choice(branches) => {
            for (i, branch) in branches.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                render(branch, out)?;
            }
        }
        Node::Repeated {
            node,
            min,
            max,
            lazy,
        } => {
            let suffix = quantifier(*min, *max)?;
            if is_atomic(node) {
                render(node, out)?;
            } else {
                out.push_str("(?:");
                render(node, out)?;
                out.push(')');
            }
            out.push_str(&suffix);
            if *lazy {
                out.push('?');
            }
        }
        Node::Group { node, name } => {
            match name {
                Some(name) => {
                    out.push_str("(?<");
                    out.push_str(name);
                    out.push('>');
                }
                None => out.push('('),
            }
            render(node, out)?;
            out.push(')');
        }
        Node::Assertion(kind, node) => {
            out.push_str(match kind {
                AssertionType::PositiveLookahead => "(?=",
                AssertionType::NegativeLookahead => "(?!",
                AssertionType::PositiveLookbehind => "(?<=",
                AssertionType::NegativeLookbehind => "(?<!",
            });
            render(node, out)?;
            out.push(')');
        }
        Node::CharacterSet {
            chars,
            ranges,
            negated,
        } => {
            out.push('[');
            if *negated {
                out.push('^');
            }
            for &c in chars {
                push_class_char(c, out);
            }
            for &(lo, hi) in ranges {
                push_class_char(lo, out);
                out.push('-');
                push_class_char(hi, out);
            }
            out.push(']');
        }
        Node::Class(kind) => out.push_str(class_token(*kind)),
    }
    Ok(())
}

/// Whether a node can take a quantifier without extra grouping.
fn is_atomic(node: &Node) -> bool {
    match node {
        // A sanitized literal is one unit if the original was a single
        // character: one char, or one backslash escape after sanitizing
        Node::Literal { text, escaped: true } => {
            let mut chars = text.chars();
            matches!(
                (chars.next(), chars.next(), chars.next()),
                (Some(_), None, _) | (Some('\\'), Some(_), None)
            )
        }
        // Raw fragments have unknown structure unless they are one char
        Node::Literal {
            text,
            escaped: false,
        } => text.chars().count() == 1,
        // `\w+` already carries a quantifier; the other class tokens are
        // single units (the line break expansion comes pre-grouped)
        Node::Class(kind) => !matches!(kind, ClassKind::Word),
        Node::CharacterSet { .. } => true,
        Node::Group { .. } => true,
        Node::Assertion(..) => true,
        Node::Sequence(nodes) => nodes.len() == 1 && is_atomic(&nodes[0]),
        // Stacked quantifiers must regroup, the engine rejects `a++`
        Node::Repeated { .. } => false,
        Node::Choice(_) => false,
        Node::Empty => false,
    }
}

/// Shortest standard token for a repetition range.
fn quantifier(min: u32, max: Option<u32>) -> Result<String, Error> {
    match (min, max) {
        (0, None) => Ok("*".to_string()),
        (1, None) => Ok("+".to_string()),
        (0, Some(1)) => Ok("?".to_string()),
        (min, None) => Ok(format!("{{{min},}}")),
        (min, Some(max)) if min > max => Err(Error::UnsupportedQuantifierRange(min, max)),
        (min, Some(max)) if min == max => Ok(format!("{{{min}}}")),
        (min, Some(max)) => Ok(format!("{{{min},{max}}}")),
    }
}

fn class_token(kind: ClassKind) -> &'static str {
    match kind {
        ClassKind::Whitespace => r"\s",
        ClassKind::Digit => r"\d",
        ClassKind::Word => r"\w+",
        ClassKind::Tab => r"\t",
        ClassKind::LineBreak => r"(?:\r\n|\r|\n)",
        ClassKind::AnyChar => ".",
    }
}

fn push_class_char(c: char, out: &mut String) {
    // Only these are special inside a bracket set
    if matches!(c, ']' | '^' | '-' | '\\') {
        out.push('\\');
    }
    out.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Flags;

    fn root(node: Node) -> RootNode {
        RootNode {
            node,
            ..RootNode::new()
        }
    }

    fn lit(text: &str) -> Node {
        Node::literal(text, true)
    }

    macro_rules! test_source {
        ($name:ident, $node:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let compiled = stringify(&root($node)).expect("should render");
                assert_eq!(compiled.source, $expected);
            }
        };
    }

    test_source!(empty_root, Node::Empty, "");
    test_source!(bare_literal, lit("abc"), "abc");
    test_source!(sequence_concatenates, lit("a").then(lit("b")), "ab");
    test_source!(choice_joins_with_pipe, lit("a").or(lit("b")), "a|b");
    test_source!(
        choice_inside_a_sequence_is_grouped,
        lit("a").then(lit("b").or(lit("c"))),
        "a(?:b|c)"
    );
    test_source!(
        quantified_sequence_is_grouped,
        lit("a").then(lit("b")).repeated(2, Some(4), false),
        "(?:ab){2,4}"
    );
    test_source!(
        quantified_multichar_literal_is_grouped,
        lit("hello").repeated(1, Some(3), false),
        "(?:hello){1,3}"
    );
    test_source!(
        quantified_single_char_is_bare,
        lit("a").repeated(0, None, false),
        "a*"
    );
    test_source!(
        quantified_escape_sequence_is_bare,
        lit(r"\.").repeated(1, None, false),
        r"\.+"
    );
    test_source!(
        one_or_more_shorthand,
        lit("a").repeated(1, None, false),
        "a+"
    );
    test_source!(
        zero_or_one_shorthand,
        lit("a").repeated(0, Some(1), false),
        "a?"
    );
    test_source!(
        exact_count_renders_single_bound,
        lit("a").repeated(3, Some(3), false),
        "a{3}"
    );
    test_source!(
        open_ended_count,
        lit("a").repeated(2, None, false),
        "a{2,}"
    );
    test_source!(lazy_appends_a_question_mark, lit("a").repeated(1, None, true), "a+?");
    test_source!(
        stacked_quantifiers_regroup,
        lit("a").repeated(1, None, false).repeated(0, Some(1), false),
        "(?:a+)?"
    );
    test_source!(
        capturing_group,
        lit("a").grouped(None).unwrap(),
        "(a)"
    );
    test_source!(
        named_group,
        lit("a").grouped(Some("word")).unwrap(),
        "(?<word>a)"
    );
    test_source!(
        quantified_group_is_bare,
        lit("ab").grouped(None).unwrap().repeated(1, None, false),
        "(ab)+"
    );
    test_source!(
        lookahead,
        lit("a").then(lit("!").asserted(AssertionType::PositiveLookahead)),
        "a(?=!)"
    );
    test_source!(
        negative_lookahead,
        lit("a").then(lit("!").asserted(AssertionType::NegativeLookahead)),
        "a(?!!)"
    );
    test_source!(
        lookbehind,
        lit("a").asserted(AssertionType::PositiveLookbehind).then(lit("b")),
        "(?<=a)b"
    );
    test_source!(
        negative_lookbehind,
        lit("a").asserted(AssertionType::NegativeLookbehind).then(lit("b")),
        "(?<!a)b"
    );
    test_source!(character_set, Node::set("abc", false), "[abc]");
    test_source!(negated_character_set, Node::set("abc", true), "[^abc]");
    test_source!(
        set_escapes_bracket_specials,
        Node::set(r"a-]^\", false),
        r"[a\-\]\^\\]"
    );
    test_source!(
        ranges_render_in_order,
        Node::ranges(&[('0', '9'), ('a', 'f')], false).unwrap(),
        "[0-9a-f]"
    );
    test_source!(
        negated_ranges,
        Node::ranges(&[('a', 'z')], true).unwrap(),
        "[^a-z]"
    );
    test_source!(word_token_is_pre_quantified, Node::Class(ClassKind::Word), r"\w+");
    test_source!(
        word_requantifies_grouped,
        Node::Class(ClassKind::Word).repeated(2, Some(2), false),
        r"(?:\w+){2}"
    );
    test_source!(
        line_break_is_atomic_under_quantifiers,
        Node::Class(ClassKind::LineBreak).repeated(1, None, false),
        r"(?:\r\n|\r|\n)+"
    );
    test_source!(
        remaining_class_tokens,
        Node::Class(ClassKind::Digit)
            .then(Node::Class(ClassKind::Whitespace))
            .then(Node::Class(ClassKind::Tab))
            .then(Node::Class(ClassKind::AnyChar)),
        r"\d\s\t."
    );

    #[test]
    fn anchors_apply_outside_the_body() {
        let root = RootNode {
            node: lit("a"),
            anchor_start: true,
            anchor_end: true,
            ..RootNode::new()
        };
        assert_eq!(stringify(&root).unwrap().source, "^a$");
    }

    #[test]
    fn anchors_wrap_a_root_alternation() {
        let root = RootNode {
            node: lit("a").or(lit("b")),
            anchor_start: true,
            anchor_end: true,
            ..RootNode::new()
        };
        assert_eq!(stringify(&root).unwrap().source, "^(?:a|b)$");
    }

    #[test]
    fn unanchored_root_alternation_stays_bare() {
        let root = root(lit("a").or(lit("b")));
        assert_eq!(stringify(&root).unwrap().source, "a|b");
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = stringify(&root(lit("a").repeated(4, Some(2), false))).unwrap_err();
        assert!(matches!(err, Error::UnsupportedQuantifierRange(4, 2)));
    }

    #[test]
    fn flags_render_in_canonical_order() {
        let wrapped = RootNode {
            node: lit("a"),
            flags: Flags::default().add("m"),
            ..RootNode::new()
        };
        assert_eq!(stringify(&wrapped).unwrap().flags, "gim");
    }

    #[test]
    fn equal_flag_sets_render_identically() {
        let a = Flags::empty().add("im").add("g");
        let b = Flags::empty().add("g").add("mi");
        assert_eq!(a.to_string(), b.to_string());
    }
}
