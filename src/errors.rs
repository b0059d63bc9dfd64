use thiserror::Error;

/// Failures reported by the auth collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account already exists: {0}")]
    SignupConflict(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Auth request rejected: {0}")]
    Rejected(String),

    #[error("Please enter your email")]
    MissingEmail,
}

/// The three ways an upload can fail on the wire.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// The server answered with a non-2xx status.
    #[error("Server error {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The request went out but nothing usable came back.
    #[error("No response from {endpoint}: {reason}")]
    NoResponse { endpoint: String, reason: String },

    /// The request could not be built or sent at all.
    #[error("Could not send request to {endpoint}: {reason}")]
    RequestSetup { endpoint: String, reason: String },
}

impl NetworkError {
    pub fn endpoint(&self) -> &str {
        match self {
            NetworkError::Status { endpoint, .. }
            | NetworkError::NoResponse { endpoint, .. }
            | NetworkError::RequestSetup { endpoint, .. } => endpoint,
        }
    }
}

#[derive(Debug, Error)]
pub enum LensError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("No active session")]
    SessionMissing,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No detection endpoint provided")]
    MissingEndpoint,

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("No image selected")]
    NoImageSelected,

    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl serde::Serialize for LensError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type LensResult<T> = Result<T, LensError>;
