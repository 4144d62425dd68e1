use thiserror::Error;

/// Rejected input, caught before any network activity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("city must not be blank")]
    BlankCity,
}

/// Failure of a single weather lookup.
///
/// Classification happens once, at the client boundary, so nothing
/// downstream has to re-derive it from message text.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS / host-resolution failure. Usually means no connectivity.
    #[error("unable to resolve weather host: {0}")]
    HostUnresolved(String),

    /// The bounded request timeout elapsed.
    #[error("weather request timed out")]
    Timeout,

    /// Any other transport failure (connection refused, reset, TLS).
    #[error("transport failure: {0}")]
    Transport(String),

    /// Non-2xx status, or a 2xx body that does not have the expected shape.
    #[error("Data Processing Error")]
    Response,
}

/// Missing or unusable client configuration. Fatal at construction,
/// never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No API key configured.\n\
         Hint: run `skywatch configure` and enter your weatherapi.com key."
    )]
    MissingApiKey,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Presentation-facing classification carried by `QueryState::Failed`.
///
/// Renderers branch on this, never on the message string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Host could not be resolved; the user is probably offline.
    Connectivity,
    Timeout,
    Transport,
    /// The provider had no usable data for the query.
    NoData,
}

impl From<&FetchError> for ErrorKind {
    fn from(err: &FetchError) -> Self {
        match err {
            FetchError::HostUnresolved(_) => ErrorKind::Connectivity,
            FetchError::Timeout => ErrorKind::Timeout,
            FetchError::Transport(_) => ErrorKind::Transport,
            FetchError::Response => ErrorKind::NoData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_map_to_kinds() {
        assert_eq!(
            ErrorKind::from(&FetchError::HostUnresolved("dns error".into())),
            ErrorKind::Connectivity
        );
        assert_eq!(ErrorKind::from(&FetchError::Timeout), ErrorKind::Timeout);
        assert_eq!(
            ErrorKind::from(&FetchError::Transport("connection reset".into())),
            ErrorKind::Transport
        );
        assert_eq!(ErrorKind::from(&FetchError::Response), ErrorKind::NoData);
    }

    #[test]
    fn response_error_keeps_original_wording() {
        assert_eq!(FetchError::Response.to_string(), "Data Processing Error");
    }
}
