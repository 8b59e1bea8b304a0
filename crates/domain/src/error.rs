use std::fmt;

/// Shared error type used across all bin-collection crates.
///
/// Every variant carries enough detail for the logs, while
/// [`Error::remediation`] yields the message the user should hear.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no postcode set on device address")]
    MissingPostcode,

    #[error("no consent token: {0}")]
    MissingConsent(String),

    #[error("device address access denied: {0}")]
    PermissionDenied(String),

    #[error("upstream returned no locations for postcode starting {0}")]
    LocationNotFound(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("unknown collection category: {0:?}")]
    UnknownCategory(String),

    #[error("invalid collection event: {0}")]
    InvalidEvent(String),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Machine-checkable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingPostcode,
    MissingConsent,
    PermissionDenied,
    LocationNotFound,
    UpstreamUnavailable,
    UnknownCategory,
    Http,
    Timeout,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingPostcode => "missing_postcode",
            Self::MissingConsent => "missing_consent",
            Self::PermissionDenied => "permission_denied",
            Self::LocationNotFound => "location_not_found",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::UnknownCategory => "unknown_category",
            Self::Http => "http",
            Self::Timeout => "timeout",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

const NOTIFY_MISSING_PERMISSIONS: &str = "I need to know where you live, so that I can look up \
    your bin collection dates.  Please use the Alexa app to give the Bin Collections skill \
    permission to access your address and post code.";
const NO_POSTCODE: &str = "It looks like you don't have a post code set.  You can set your \
    address in the Alexa app.";
const POSTCODE_LOOKUP_FAIL: &str = "I couldn't find your post code in the council's database.  \
    If you live in South Cambridgeshire, please use the Alexa app to check that the address \
    configured for your device is correct.";
const NO_DATA_RETURNED: &str = "I'm sorry, the council's web site did not return any bin \
    collections for your device's location, please check the address configured for this \
    device in the Alexa app is correct.";
const WEB_ERROR: &str = "I got an error code from the council web site, please try later";
const WEB_TIMEOUT: &str = "The council website took too long to respond.  Please try later.";
const GENERIC: &str = "Something went wrong - please try again";

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingPostcode => ErrorKind::MissingPostcode,
            Self::MissingConsent(_) => ErrorKind::MissingConsent,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::LocationNotFound(_) => ErrorKind::LocationNotFound,
            Self::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::UnknownCategory(_) => ErrorKind::UnknownCategory,
            Self::Http(_) => ErrorKind::Http,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::InvalidEvent(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// The user-facing message for this error.
    pub fn remediation(&self) -> &'static str {
        match self.kind() {
            ErrorKind::MissingConsent | ErrorKind::PermissionDenied => NOTIFY_MISSING_PERMISSIONS,
            ErrorKind::MissingPostcode => NO_POSTCODE,
            ErrorKind::LocationNotFound => POSTCODE_LOOKUP_FAIL,
            ErrorKind::UpstreamUnavailable => NO_DATA_RETURNED,
            ErrorKind::Http => WEB_ERROR,
            ErrorKind::Timeout => WEB_TIMEOUT,
            ErrorKind::UnknownCategory | ErrorKind::Internal => GENERIC,
        }
    }

    /// Network failures that a later attempt may not hit.  These are
    /// distinct from "the upstream has no data for you".
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout(_))
    }

    /// Whether the user should be prompted to grant address permission.
    pub fn needs_consent_prompt(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MissingConsent | ErrorKind::PermissionDenied
        )
    }
}
