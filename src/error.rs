use std::fmt::{self, Display, Formatter};
use std::io;

#[derive(Debug)]
pub enum StripError {
    /// `fill` bounds fell outside the strand. Nothing was written.
    Range {
        start: usize,
        end: usize,
        led_count: usize,
    },
    UnknownStage(String),
    UnknownResult(String),
    BadDirective(String),
    Io(io::Error),
}

impl Display for StripError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            StripError::Range {
                start,
                end,
                led_count,
            } => write!(
                f,
                "pixel range {start}..{end} outside strand of {led_count} leds"
            ),
            StripError::UnknownStage(name) => write!(f, "no stage named '{name}' is configured"),
            StripError::UnknownResult(token) => write!(f, "unrecognised build result '{token}'"),
            StripError::BadDirective(message) => write!(f, "unparseable build message '{message}'"),
            StripError::Io(err) => write!(f, "strip output failed: {err}"),
        }
    }
}

impl std::error::Error for StripError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StripError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for StripError {
    fn from(err: io::Error) -> Self {
        StripError::Io(err)
    }
}
