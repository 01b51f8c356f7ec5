use std::collections::BTreeSet;
use std::fmt;

use crate::error::Error;

/// One immutable unit of an expression tree.
///
/// Constructors only ever build new nodes; nothing is mutated after
/// creation, so partial trees can be shared and reused freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    // Matches the empty string
    Empty,
    // A fragment of pattern text; `escaped` records whether it came through
    // the sanitizer or is trusted raw source
    Literal { text: String, escaped: bool },
    // A sequence of nodes that each must match in order
    Sequence(Vec<Node>),
    // Exactly one of the branches, earlier branches win
    Choice(Vec<Node>),
    // Repeat a node between min and max times (no max = unbounded)
    Repeated {
        node: Box<Node>,
        min: u32,
        max: Option<u32>,
        lazy: bool,
    },
    // A capturing group, named if `name` is present
    Group { node: Box<Node>, name: Option<String> },
    // A zero-width assertion around another node
    Assertion(AssertionType, Box<Node>),
    // A character set, may be negated (eg [^a-f0])
    CharacterSet {
        chars: Vec<char>,
        ranges: Vec<(char, char)>,
        negated: bool,
    },
    // Predefined character classes with native shorthand tokens
    Class(ClassKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionType {
    PositiveLookahead,
    NegativeLookahead,
    PositiveLookbehind,
    NegativeLookbehind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Whitespace,
    Digit,
    Word,
    Tab,
    LineBreak,
    AnyChar,
}

impl Default for Node {
    fn default() -> Node {
        Node::Empty
    }
}

impl Node {
    /// A literal fragment. Empty text collapses to [`Node::Empty`] so chains
    /// starting from nothing don't accumulate dead nodes.
    pub fn literal(text: impl Into<String>, escaped: bool) -> Node {
        let text = text.into();
        if text.is_empty() {
            Node::Empty
        } else {
            Node::Literal { text, escaped }
        }
    }

    /// Concatenate `other` after `self`. An existing sequence absorbs the
    /// new node(s) flattened one level; deeper nesting is left alone so
    /// grouping decisions stay local.
    pub fn then(self, other: Node) -> Node {
        match (self, other) {
            (Node::Empty, b) => b,
            (a, Node::Empty) => a,
            (Node::Sequence(mut nodes), Node::Sequence(tail)) => {
                nodes.extend(tail);
                Node::Sequence(nodes)
            }
            (Node::Sequence(mut nodes), b) => {
                nodes.push(b);
                Node::Sequence(nodes)
            }
            (a, b) => Node::Sequence(vec![a, b]),
        }
    }

    pub fn or(self, other: Node) -> Node {
        Node::choice(vec![self, other])
    }

    /// Build an alternation. Nested choices flatten one level (alternation
    /// is associative); sequence branches keep their internal structure.
    pub fn choice(branches: Vec<Node>) -> Node {
        let mut flat = Vec::with_capacity(branches.len());
        for branch in branches {
            match branch {
                Node::Choice(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Node::Choice(flat)
    }

    pub fn maybe(self, other: Node) -> Node {
        self.then(other.repeated(0, Some(1), false))
    }

    pub fn repeated(self, min: u32, max: Option<u32>, lazy: bool) -> Node {
        Node::Repeated {
            node: Box::new(self),
            min,
            max,
            lazy,
        }
    }

    /// Wrap in a capturing group. A present name must be a valid engine
    /// group name: ASCII word characters, not starting with a digit.
    pub fn grouped(self, name: Option<&str>) -> Result<Node, Error> {
        if let Some(name) = name {
            if !is_valid_group_name(name) {
                return Err(Error::InvalidGroupName(name.to_string()));
            }
        }
        Ok(Node::Group {
            node: Box::new(self),
            name: name.map(str::to_string),
        })
    }

    pub fn asserted(self, kind: AssertionType) -> Node {
        Node::Assertion(kind, Box::new(self))
    }

    /// A character set from individual characters, deduplicated in first-seen
    /// order. An empty set can match nothing at all, so it degrades to
    /// [`Node::Empty`] with a one-shot warning instead of rendering `[]`.
    pub fn set(chars: &str, negated: bool) -> Node {
        let mut deduped: Vec<char> = Vec::new();
        for c in chars.chars() {
            if !deduped.contains(&c) {
                deduped.push(c);
            }
        }
        if deduped.is_empty() {
            crate::sanitize::warn_once("empty character set matches nothing, dropping it");
            return Node::Empty;
        }
        Node::CharacterSet {
            chars: deduped,
            ranges: Vec::new(),
            negated,
        }
    }

    /// A character set from `(lo, hi)` range pairs.
    pub fn ranges(pairs: &[(char, char)], negated: bool) -> Result<Node, Error> {
        for &(lo, hi) in pairs {
            // Ranges must be lo <= hi (a-a is technically valid)
            if lo > hi {
                return Err(Error::InvalidRange(lo, hi));
            }
        }
        if pairs.is_empty() {
            crate::sanitize::warn_once("empty character set matches nothing, dropping it");
            return Ok(Node::Empty);
        }
        Ok(Node::CharacterSet {
            chars: Vec::new(),
            ranges: pairs.to_vec(),
            negated,
        })
    }
}

fn is_valid_group_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The accumulated flag set carried by a [`RootNode`].
///
/// Flags are single characters, stored deduplicated and rendered in
/// ascending ASCII order so equal sets always render identically. Unknown
/// characters are carried verbatim; only the engine decides what they mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flags(BTreeSet<char>);

impl Default for Flags {
    // All matches, any case, one line at a time
    fn default() -> Flags {
        Flags::from_chars("gi")
    }
}

impl Flags {
    pub fn empty() -> Flags {
        Flags(BTreeSet::new())
    }

    pub fn from_chars(chars: &str) -> Flags {
        Flags(chars.chars().collect())
    }

    pub fn add(&self, chars: &str) -> Flags {
        let mut set = self.0.clone();
        set.extend(chars.chars());
        Flags(set)
    }

    pub fn remove(&self, chars: &str) -> Flags {
        let mut set = self.0.clone();
        for c in chars.chars() {
            set.remove(&c);
        }
        Flags(set)
    }

    pub fn contains(&self, flag: char) -> bool {
        self.0.contains(&flag)
    }

    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0 {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// A node plus the anchors and flags that apply outside of it.
///
/// This is the unit a fluent expression value holds and rebuilds on every
/// call. The anchors are not part of the node tree: appending content past
/// the current end would contradict a `$` anchor, so every appending or
/// repeating operation drops `anchor_end` first and only
/// `anchored_end(true)` reintroduces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootNode {
    pub node: Node,
    pub anchor_start: bool,
    pub anchor_end: bool,
    pub flags: Flags,
}

impl RootNode {
    pub fn new() -> RootNode {
        RootNode::default()
    }

    pub fn append(self, node: Node) -> RootNode {
        let RootNode {
            node: current,
            anchor_start,
            flags,
            ..
        } = self;
        RootNode {
            node: current.then(node),
            anchor_start,
            anchor_end: false,
            flags,
        }
    }

    pub fn alternate(self, node: Node) -> RootNode {
        let RootNode {
            node: current,
            anchor_start,
            anchor_end,
            flags,
        } = self;
        RootNode {
            node: current.or(node),
            anchor_start,
            anchor_end,
            flags,
        }
    }

    pub fn quantify(self, min: u32, max: Option<u32>, lazy: bool) -> RootNode {
        let RootNode {
            node,
            anchor_start,
            flags,
            ..
        } = self;
        RootNode {
            node: node.repeated(min, max, lazy),
            anchor_start,
            anchor_end: false,
            flags,
        }
    }

    pub fn anchored_start(self, enabled: bool) -> RootNode {
        RootNode {
            anchor_start: enabled,
            ..self
        }
    }

    pub fn anchored_end(self, enabled: bool) -> RootNode {
        RootNode {
            anchor_end: enabled,
            ..self
        }
    }

    pub fn add_flags(self, chars: &str) -> RootNode {
        let flags = self.flags.add(chars);
        RootNode { flags, ..self }
    }

    pub fn remove_flags(self, chars: &str) -> RootNode {
        let flags = self.flags.remove(chars);
        RootNode { flags, ..self }
    }
}
