use std::fmt;

/// Failures raised while composing or rendering an expression.
///
/// Structural problems are programmer errors and surface synchronously at
/// the call that introduced them, not when the finished pattern is handed to
/// the engine.
#[derive(Debug)]
pub enum Error {
    /// A character range whose low end sorts after its high end
    InvalidRange(char, char),
    /// A capture group name the engine would reject
    InvalidGroupName(String),
    /// A repetition with finite bounds where min exceeds max
    UnsupportedQuantifierRange(u32, u32),
    /// The native engine rejected the rendered pattern
    Engine(fancy_regex::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRange(lo, hi) => write!(f, "Invalid range: {}-{}", lo, hi),
            Error::InvalidGroupName(name) => write!(f, "Invalid group name: {:?}", name),
            Error::UnsupportedQuantifierRange(min, max) => {
                write!(f, "Invalid repeat range: {{{},{}}}", min, max)
            }
            Error::Engine(err) => write!(f, "Engine rejected pattern: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<fancy_regex::Error> for Error {
    fn from(err: fancy_regex::Error) -> Error {
        Error::Engine(err)
    }
}
