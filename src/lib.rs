//! Build regular expressions out of composable parts instead of writing
//! pattern syntax by hand.
//!
//! [`Expr`] is an immutable chainable value: every call returns a new
//! expression, so partial patterns can be stored, shared across threads and
//! extended along different branches without coordination. Calling
//! [`Expr::compile`] renders the composition into pattern source text plus a
//! flag string, and [`Expr::to_regex`] hands both to the native engine.
//!
//! ```
//! use verbex::Expr;
//!
//! # fn main() -> Result<(), verbex::Error> {
//! let hex_pair = Expr::new()
//!     .char_of_ranges(&[('0', '9'), ('a', 'f')])?
//!     .repeat_exactly(2);
//!
//! let color = Expr::new()
//!     .find("#")
//!     .then(hex_pair.clone())
//!     .then(hex_pair.clone())
//!     .then(hex_pair);
//!
//! let compiled = color.compile()?;
//! assert_eq!(compiled.source, "#[0-9a-f]{2}[0-9a-f]{2}[0-9a-f]{2}");
//! assert_eq!(compiled.flags, "gi");
//! assert!(color.is_match("#C0FFEE")?);
//! # Ok(())
//! # }
//! ```
//!
//! Repetition always applies to the whole expression built so far; to repeat
//! only a part, build the part as its own [`Expr`] and append it with
//! [`Expr::then`]. The renderer inserts `(?:...)` grouping wherever a bare
//! fragment would bind differently than it was composed.

pub mod builder;
pub mod error;
pub mod sanitize;
pub mod stringify;
pub mod types;

pub use builder::Expr;
pub use error::Error;
pub use sanitize::{escape, Input};
pub use stringify::{stringify, Compiled};
pub use types::{AssertionType, ClassKind, Flags, Node, RootNode};
