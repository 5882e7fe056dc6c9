use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// An authenticated call was made before `authenticate()` succeeded.
    NotAuthenticated,
    /// Pairing or bearer token exchange failed.
    Authentication(String),
    /// The cloud answered with something other than 200.
    Api { status: u16, body: String },
    Http(reqwest::Error),
    Protocol(String),
    NoDevice,
    UnknownZone(u8),
    InvalidMode(String),
    Closed,
    Io(std::io::Error),
}

impl Error {
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::NotAuthenticated | Error::Authentication(_))
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api { .. } | Error::Http(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotAuthenticated => write!(f, "not authenticated"),
            Error::Authentication(msg) => write!(f, "authentication failed: {msg}"),
            Error::Api { status, body } => write!(f, "API request failed: {status}, {body}"),
            Error::Http(e) => write!(f, "network error during API request: {e}"),
            Error::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Error::NoDevice => write!(f, "no AC system found on account"),
            Error::UnknownZone(id) => write!(f, "unknown zone: {id}"),
            Error::InvalidMode(mode) => write!(f, "invalid mode: {mode}"),
            Error::Closed => write!(f, "client closed"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
