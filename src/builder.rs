use crate::error::Error;
use crate::sanitize::{self, Input};
use crate::stringify::{stringify, Compiled};
use crate::types::{AssertionType, ClassKind, Node, RootNode};

/// A chainable regular-expression value.
///
/// Every method returns a fresh expression; the receiver is never mutated,
/// so partial patterns can be stored, shared and extended along different
/// branches. Rendering happens once, in [`Expr::compile`], and
/// [`Expr::to_regex`] hands the result to the native engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expr {
    root: RootNode,
}

impl Expr {
    /// An empty expression with the default flag set.
    pub fn new() -> Expr {
        Expr::default()
    }

    /// Start from an absorbed input. A compiled pattern contributes its
    /// outer anchors and flag set as the starting state; everything else
    /// starts with the defaults.
    pub fn from(value: impl Into<Input>) -> Expr {
        let fragment = sanitize::absorb(value.into());
        Expr {
            root: RootNode {
                node: fragment.node,
                anchor_start: fragment.anchor_start,
                anchor_end: fragment.anchor_end,
                flags: fragment.flags.unwrap_or_default(),
            },
        }
    }

    /// The wrapped root, mostly useful for inspecting anchors and flags.
    pub fn root(&self) -> &RootNode {
        &self.root
    }

    fn map_root(self, f: impl FnOnce(RootNode) -> RootNode) -> Expr {
        Expr { root: f(self.root) }
    }

    fn absorb(value: impl Into<Input>) -> Node {
        sanitize::absorb(value.into()).node
    }

    // Anchors

    pub fn start_of_line(self, enabled: bool) -> Expr {
        self.map_root(|root| root.anchored_start(enabled))
    }

    pub fn end_of_line(self, enabled: bool) -> Expr {
        self.map_root(|root| root.anchored_end(enabled))
    }

    // Composition

    /// Append `value` so it must match next.
    pub fn then(self, value: impl Into<Input>) -> Expr {
        let node = Expr::absorb(value);
        self.map_root(|root| root.append(node))
    }

    /// Alias for [`Expr::then`] that reads better at the start of a chain.
    pub fn find(self, value: impl Into<Input>) -> Expr {
        self.then(value)
    }

    /// Append `value` as optional.
    pub fn maybe(self, value: impl Into<Input>) -> Expr {
        let node = Expr::absorb(value).repeated(0, Some(1), false);
        self.map_root(|root| root.append(node))
    }

    /// Turn the whole expression so far into an alternation with `value`.
    pub fn or(self, value: impl Into<Input>) -> Expr {
        let node = Expr::absorb(value);
        self.map_root(|root| root.alternate(node))
    }

    // Wildcards

    /// Any run of characters, including none (`.*`).
    pub fn anything(self, lazy: bool) -> Expr {
        let node = Node::Class(ClassKind::AnyChar).repeated(0, None, lazy);
        self.map_root(|root| root.append(node))
    }

    /// Any run of characters except the given ones (`[^...]*`).
    pub fn anything_but(self, chars: &str, lazy: bool) -> Expr {
        let node = Node::set(chars, true).repeated(0, None, lazy);
        self.map_root(|root| root.append(node))
    }

    /// At least one character (`.+`).
    pub fn something(self) -> Expr {
        let node = Node::Class(ClassKind::AnyChar).repeated(1, None, false);
        self.map_root(|root| root.append(node))
    }

    /// At least one character, none of them in `chars` (`[^...]+`).
    pub fn something_but(self, chars: &str) -> Expr {
        let node = Node::set(chars, true).repeated(1, None, false);
        self.map_root(|root| root.append(node))
    }

    // Character sets

    /// Zero or more characters out of `chars` (`[...]*`).
    pub fn any_of(self, chars: &str) -> Expr {
        let node = Node::set(chars, false).repeated(0, None, false);
        self.map_root(|root| root.append(node))
    }

    /// One or more characters out of `chars` (`[...]+`).
    pub fn some_of(self, chars: &str) -> Expr {
        let node = Node::set(chars, false).repeated(1, None, false);
        self.map_root(|root| root.append(node))
    }

    /// Exactly one character out of `chars` (`[...]`).
    pub fn one_of(self, chars: &str) -> Expr {
        let node = Node::set(chars, false);
        self.map_root(|root| root.append(node))
    }

    /// Exactly one character inside the given ranges.
    pub fn char_of_ranges(self, pairs: &[(char, char)]) -> Result<Expr, Error> {
        let node = Node::ranges(pairs, false)?;
        Ok(self.map_root(|root| root.append(node)))
    }

    /// Exactly one character outside the given ranges.
    pub fn char_not_of_ranges(self, pairs: &[(char, char)]) -> Result<Expr, Error> {
        let node = Node::ranges(pairs, true)?;
        Ok(self.map_root(|root| root.append(node)))
    }

    // Built-in classes

    pub fn whitespace(self) -> Expr {
        self.class(ClassKind::Whitespace)
    }

    pub fn digit(self) -> Expr {
        self.class(ClassKind::Digit)
    }

    /// One word, i.e. a run of word characters.
    pub fn word(self) -> Expr {
        self.class(ClassKind::Word)
    }

    pub fn tab(self) -> Expr {
        self.class(ClassKind::Tab)
    }

    pub fn line_break(self) -> Expr {
        self.class(ClassKind::LineBreak)
    }

    /// Shorthand for [`Expr::line_break`].
    pub fn br(self) -> Expr {
        self.line_break()
    }

    pub fn any_char(self) -> Expr {
        self.class(ClassKind::AnyChar)
    }

    fn class(self, kind: ClassKind) -> Expr {
        self.map_root(|root| root.append(Node::Class(kind)))
    }

    // Lookaround

    /// Require `value` next without consuming it.
    pub fn followed_by(self, value: impl Into<Input>) -> Expr {
        let node = Expr::absorb(value).asserted(AssertionType::PositiveLookahead);
        self.map_root(|root| root.append(node))
    }

    /// Forbid `value` next without consuming anything.
    pub fn not_followed_by(self, value: impl Into<Input>) -> Expr {
        let node = Expr::absorb(value).asserted(AssertionType::NegativeLookahead);
        self.map_root(|root| root.append(node))
    }

    pub fn preceded_by(self, value: impl Into<Input>) -> Expr {
        let node = Expr::absorb(value).asserted(AssertionType::PositiveLookbehind);
        self.map_root(|root| root.append(node))
    }

    pub fn not_preceded_by(self, value: impl Into<Input>) -> Expr {
        let node = Expr::absorb(value).asserted(AssertionType::NegativeLookbehind);
        self.map_root(|root| root.append(node))
    }

    // Repetition, applied to the whole expression so far. Repeating only a
    // part of a pattern is expressed by building the part as its own
    // expression and appending it with `then`.

    pub fn repeat(self, min: u32, max: Option<u32>) -> Expr {
        self.map_root(|root| root.quantify(min, max, false))
    }

    pub fn repeat_exactly(self, count: u32) -> Expr {
        self.map_root(|root| root.quantify(count, Some(count), false))
    }

    pub fn one_or_more(self, lazy: bool) -> Expr {
        self.map_root(|root| root.quantify(1, None, lazy))
    }

    pub fn zero_or_more(self, lazy: bool) -> Expr {
        self.map_root(|root| root.quantify(0, None, lazy))
    }

    /// Wrap the whole expression so far in a capturing group.
    pub fn capture(self, name: Option<&str>) -> Result<Expr, Error> {
        let RootNode {
            node,
            anchor_start,
            anchor_end,
            flags,
        } = self.root;
        Ok(Expr {
            root: RootNode {
                node: node.grouped(name)?,
                anchor_start,
                anchor_end,
                flags,
            },
        })
    }

    // Flags

    pub fn add_flags(self, chars: &str) -> Expr {
        self.map_root(|root| root.add_flags(chars))
    }

    pub fn remove_flags(self, chars: &str) -> Expr {
        self.map_root(|root| root.remove_flags(chars))
    }

    /// Toggle case-insensitive matching (on by default).
    pub fn with_any_case(self, enabled: bool) -> Expr {
        if enabled {
            self.add_flags("i")
        } else {
            self.remove_flags("i")
        }
    }

    /// Stop after the first match instead of matching globally.
    pub fn stop_at_first(self, enabled: bool) -> Expr {
        if enabled {
            self.remove_flags("g")
        } else {
            self.add_flags("g")
        }
    }

    /// Keep `^` and `$` at the text boundaries instead of per line (the
    /// default; disabling adds the multiline flag).
    pub fn search_one_line(self, enabled: bool) -> Expr {
        if enabled {
            self.remove_flags("m")
        } else {
            self.add_flags("m")
        }
    }

    // Output

    /// Render to pattern source text and the canonical flag string.
    pub fn compile(&self) -> Result<Compiled, Error> {
        stringify(&self.root)
    }

    /// The rendered source text alone.
    pub fn source(&self) -> Result<String, Error> {
        Ok(self.compile()?.source)
    }

    /// Build the native engine object. Flags the engine can express inline
    /// (`i`, `m`, `s`, `x`, `U`) are applied as one leading group; the rest
    /// only ride along in the compiled flag string, since the engine scopes
    /// concerns like global matching at the call site.
    pub fn to_regex(&self) -> Result<fancy_regex::Regex, Error> {
        let compiled = self.compile()?;
        let inline: String = compiled
            .flags
            .chars()
            .filter(|&c| matches!(c, 'i' | 'm' | 's' | 'x' | 'U'))
            .collect();
        let pattern = if inline.is_empty() {
            compiled.source
        } else {
            format!("(?{inline}){}", compiled.source)
        };
        fancy_regex::Regex::new(&pattern).map_err(Error::Engine)
    }

    /// Compile and test `haystack` in one call.
    pub fn is_match(&self, haystack: &str) -> Result<bool, Error> {
        self.to_regex()?.is_match(haystack).map_err(Error::Engine)
    }
}

impl From<Expr> for Input {
    fn from(expr: Expr) -> Input {
        Input::Sub(expr.root)
    }
}

impl From<&Expr> for Input {
    fn from(expr: &Expr) -> Input {
        Input::Sub(expr.root.clone())
    }
}
