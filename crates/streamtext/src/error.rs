use thiserror::Error;

/// Errors raised while fetching or reading a response.
///
/// Malformed UTF-8 is deliberately absent: the decoder substitutes or drops
/// invalid input according to [`MalformedPolicy`](crate::MalformedPolicy).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A transport read, write or close failed.
    #[cfg(feature = "std")]
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection to the server could not be opened.
    #[cfg(feature = "std")]
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address as given by the caller.
        addr: alloc::string::String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// A buffer capacity of zero was configured.
    #[error("{what} capacity must be at least 1")]
    ZeroCapacity {
        /// Which buffer was misconfigured.
        what: &'static str,
    },

    /// The request path is empty.
    #[error("request path must not be empty")]
    EmptyPath,

    /// The request path contains whitespace or control characters that would
    /// corrupt the request line.
    #[error("invalid character {0:?} in request path")]
    InvalidPath(char),
}
