use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use crate::types::{Flags, Node, RootNode};

/// Characters that must be escaped for a string to match itself literally.
const METACHARACTERS: &str = r".*+?^${}()|[]\/";

pub(crate) fn is_meta(c: char) -> bool {
    METACHARACTERS.contains(c)
}

/// Escape pattern metacharacters so `value` matches itself in any position.
pub fn escape(value: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(value.len());
    let mut changed = false;

    for ch in value.chars() {
        if is_meta(ch) {
            out.push('\\');
            changed = true;
        }
        out.push(ch);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(value)
    }
}

/// A caller-supplied value, classified exactly once at this boundary. After
/// absorption nothing downstream re-inspects what kind of input a node came
/// from.
#[derive(Debug, Clone)]
pub enum Input {
    /// Plain text; escaped so it matches itself literally
    Text(String),
    /// An integer, trusted as raw pattern text (digits never collide with
    /// metacharacters)
    Number(i64),
    /// The source of an already-compiled native pattern, absorbed unchanged
    /// apart from anchor and flag extraction
    Pattern(String),
    /// Another expression's root, absorbed as its bare node
    Sub(RootNode),
    /// Anything that cannot be made matchable; degrades to an empty match
    /// with a one-shot warning rather than failing the whole chain
    Unsupported(&'static str),
}

impl From<&str> for Input {
    fn from(value: &str) -> Input {
        Input::Text(value.to_string())
    }
}

impl From<String> for Input {
    fn from(value: String) -> Input {
        Input::Text(value)
    }
}

impl From<char> for Input {
    fn from(value: char) -> Input {
        Input::Text(value.to_string())
    }
}

impl From<i64> for Input {
    fn from(value: i64) -> Input {
        Input::Number(value)
    }
}

impl From<i32> for Input {
    fn from(value: i32) -> Input {
        Input::Number(value.into())
    }
}

impl From<u32> for Input {
    fn from(value: u32) -> Input {
        Input::Number(value.into())
    }
}

impl From<u64> for Input {
    fn from(value: u64) -> Input {
        match i64::try_from(value) {
            Ok(value) => Input::Number(value),
            Err(_) => Input::Unsupported("oversized integer"),
        }
    }
}

impl From<f64> for Input {
    fn from(value: f64) -> Input {
        // Whole-number floats stringify to plain digits; anything else would
        // leak a `.` or worse into the pattern
        if value.is_finite() && value.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&value) {
            Input::Number(value as i64)
        } else {
            Input::Unsupported("non-integral number")
        }
    }
}

impl From<&fancy_regex::Regex> for Input {
    fn from(value: &fancy_regex::Regex) -> Input {
        Input::Pattern(value.as_str().to_string())
    }
}

impl From<fancy_regex::Regex> for Input {
    fn from(value: fancy_regex::Regex) -> Input {
        Input::Pattern(value.as_str().to_string())
    }
}

impl From<RootNode> for Input {
    fn from(value: RootNode) -> Input {
        Input::Sub(value)
    }
}

/// What absorption hands the root wrapper: a node plus any anchors and
/// flags extracted from the input itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub node: Node,
    pub anchor_start: bool,
    pub anchor_end: bool,
    pub flags: Option<Flags>,
}

impl Fragment {
    fn bare(node: Node) -> Fragment {
        Fragment {
            node,
            anchor_start: false,
            anchor_end: false,
            flags: None,
        }
    }
}

/// Convert one classified input into root-wrapper fields.
pub fn absorb(input: Input) -> Fragment {
    match input {
        Input::Text(text) => Fragment::bare(Node::literal(escape(&text).into_owned(), true)),
        Input::Number(value) => Fragment::bare(Node::literal(value.to_string(), false)),
        Input::Pattern(source) => absorb_pattern(&source),
        Input::Sub(root) => Fragment::bare(root.node),
        Input::Unsupported(kind) => {
            warn_once(&format!(
                "unsupported input ({kind}), matching the empty string instead"
            ));
            Fragment::bare(Node::Empty)
        }
    }
}

/// A compiled pattern is already valid source, so it passes through
/// untouched except that outer anchors move into the root wrapper and a
/// leading inline flag group carries over as the starting flag set.
fn absorb_pattern(source: &str) -> Fragment {
    let mut rest = source;
    let mut flags = None;

    if let Some(after) = rest.strip_prefix("(?") {
        if let Some(end) = after.find(')') {
            let candidate = &after[..end];
            // Only a purely additive flag group is safe to lift out;
            // `(?:`, `(?=` and scoped `(?i-m)` forms stay in the source
            if !candidate.is_empty() && candidate.chars().all(|c| c.is_ascii_alphabetic()) {
                flags = Some(Flags::from_chars(candidate));
                rest = &after[end + 1..];
            }
        }
    }

    let anchor_start = rest.starts_with('^');
    if anchor_start {
        rest = &rest[1..];
    }

    let anchor_end = ends_with_unescaped_dollar(rest);
    if anchor_end {
        rest = &rest[..rest.len() - 1];
    }

    Fragment {
        node: Node::literal(rest, false),
        anchor_start,
        anchor_end,
        flags,
    }
}

fn ends_with_unescaped_dollar(source: &str) -> bool {
    if !source.ends_with('$') {
        return false;
    }
    // A `$` behind an odd number of backslashes is a literal dollar sign
    let backslashes = source[..source.len() - 1]
        .chars()
        .rev()
        .take_while(|&c| c == '\\')
        .count();
    backslashes % 2 == 0
}

fn emitted_warnings() -> &'static Mutex<HashSet<String>> {
    static EMITTED: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    EMITTED.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Emit `message` through the `log` facade the first time it is seen.
/// Repeats are swallowed so misuse stays visible without flooding logs.
pub(crate) fn warn_once(message: &str) {
    let mut emitted = match emitted_warnings().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if emitted.insert(message.to_string()) {
        log::warn!("{message}");
    }
}

#[cfg(test)]
pub(crate) fn already_warned(message: &str) -> bool {
    let emitted = match emitted_warnings().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    emitted.contains(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_escape {
        ($name:ident, $input:expr, $expected:expr) => {
            #[test]
            fn $name() {
                assert_eq!(escape($input), $expected);
            }
        };
    }

    test_escape!(escapes_dots, "1.5", r"1\.5");
    test_escape!(
        escapes_every_metacharacter,
        r".*+?^${}()|[]\/",
        r"\.\*\+\?\^\$\{\}\(\)\|\[\]\\\/"
    );
    test_escape!(leaves_plain_text_alone, "plain text", "plain text");
    test_escape!(leaves_unicode_alone, "naïve", "naïve");

    #[test]
    fn plain_text_borrows_instead_of_allocating() {
        assert!(matches!(escape("nothing special"), Cow::Borrowed(_)));
    }

    #[test]
    fn text_input_is_escaped() {
        let fragment = absorb(Input::from("a.b"));
        assert_eq!(fragment.node, Node::literal(r"a\.b", true));
    }

    #[test]
    fn number_input_is_trusted_raw() {
        let fragment = absorb(Input::from(42));
        assert_eq!(fragment.node, Node::literal("42", false));
    }

    #[test]
    fn integral_floats_are_numbers() {
        let fragment = absorb(Input::from(7.0));
        assert_eq!(fragment.node, Node::literal("7", false));
    }

    #[test]
    fn pattern_source_passes_through_untouched() {
        let re = fancy_regex::Regex::new(r"a\d+z").unwrap();
        let fragment = absorb(Input::from(&re));
        assert_eq!(fragment.node, Node::literal(r"a\d+z", false));
        assert!(!fragment.anchor_start && !fragment.anchor_end);
        assert_eq!(fragment.flags, None);
    }

    #[test]
    fn pattern_anchors_are_extracted() {
        let re = fancy_regex::Regex::new("^abc$").unwrap();
        let fragment = absorb(Input::from(&re));
        assert!(fragment.anchor_start && fragment.anchor_end);
        assert_eq!(fragment.node, Node::literal("abc", false));
    }

    #[test]
    fn escaped_trailing_dollar_is_a_literal() {
        let re = fancy_regex::Regex::new(r"abc\$").unwrap();
        let fragment = absorb(Input::from(&re));
        assert!(!fragment.anchor_end);
        assert_eq!(fragment.node, Node::literal(r"abc\$", false));
    }

    #[test]
    fn leading_inline_flags_carry_over() {
        let re = fancy_regex::Regex::new("(?im)abc").unwrap();
        let fragment = absorb(Input::from(&re));
        assert_eq!(fragment.flags, Some(Flags::from_chars("im")));
        assert_eq!(fragment.node, Node::literal("abc", false));
    }

    #[test]
    fn non_capturing_group_prefix_is_not_a_flag_group() {
        let re = fancy_regex::Regex::new("(?:ab)c").unwrap();
        let fragment = absorb(Input::from(&re));
        assert_eq!(fragment.flags, None);
        assert_eq!(fragment.node, Node::literal("(?:ab)c", false));
    }

    #[test]
    fn sub_expression_contributes_only_its_node() {
        let root = RootNode::new()
            .anchored_start(true)
            .append(Node::literal("a", true))
            .anchored_end(true);
        let fragment = absorb(Input::from(root));
        assert_eq!(fragment.node, Node::literal("a", true));
        assert!(!fragment.anchor_start && !fragment.anchor_end);
        assert_eq!(fragment.flags, None);
    }

    #[test]
    fn unsupported_input_degrades_to_empty_and_warns_once() {
        let fragment = absorb(Input::from(f64::NAN));
        assert_eq!(fragment.node, Node::Empty);
        assert!(already_warned(
            "unsupported input (non-integral number), matching the empty string instead"
        ));
        // A second absorption still degrades quietly
        let fragment = absorb(Input::from(0.5));
        assert_eq!(fragment.node, Node::Empty);
    }

    #[test]
    fn oversized_integers_degrade() {
        let fragment = absorb(Input::from(u64::MAX));
        assert_eq!(fragment.node, Node::Empty);
    }

    #[test]
    fn warnings_latch_per_distinct_message() {
        warn_once("latch test message");
        warn_once("latch test message");
        assert!(already_warned("latch test message"));
        assert!(!already_warned("a message never emitted"));
    }
}
