use thiserror::Error;

/// Proxy error taxonomy
///
/// `Clone` is required: deduplicated waiters all receive the same failure
/// through a broadcast channel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream rejected request ({status}): {body}")]
    UpstreamRejected { status: u16, body: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found in cache: {0}")]
    NotFoundInCache(String),

    #[error("Computation error: {0}")]
    Computation(String),
}

impl ProxyError {
    /// Whether a retry on a later request can reasonably succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            ProxyError::UpstreamUnavailable(_) => true,
            ProxyError::UpstreamRejected { .. } => true,
            ProxyError::NotFoundInCache(_) => true,
            _ => false,
        }
    }

    /// Short machine-readable code for error response bodies
    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            ProxyError::UpstreamRejected { .. } => "UPSTREAM_REJECTED",
            ProxyError::InvalidRequest(_) => "INVALID_REQUEST",
            ProxyError::NotFoundInCache(_) => "NOT_FOUND_IN_CACHE",
            ProxyError::Computation(_) => "COMPUTATION_ERROR",
        }
    }

    /// HTTP status the webserver surfaces for this error
    ///
    /// The upstream status is propagated when it is an actual error status;
    /// an upstream rejection carried inside a 2xx body maps to 500, since
    /// error responses must be non-2xx.
    pub fn http_status(&self) -> u16 {
        match self {
            ProxyError::UpstreamUnavailable(_) => 500,
            ProxyError::UpstreamRejected { status, .. } => {
                if *status >= 400 {
                    *status
                } else {
                    500
                }
            }
            ProxyError::InvalidRequest(_) => 400,
            ProxyError::NotFoundInCache(_) => 404,
            ProxyError::Computation(_) => 500,
        }
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;
