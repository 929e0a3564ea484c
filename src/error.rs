use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {path}")]
    Status { path: String, status: u16 },

    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported subnet: {0}")]
    UnsupportedSubnet(u8),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("profile '{name}' not found (known: {known})")]
    ProfileNotFound { name: String, known: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Network failure, non-2xx or unreadable body on a call that had to succeed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http { .. } | Error::Status { .. } | Error::Decode { .. }
        )
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
