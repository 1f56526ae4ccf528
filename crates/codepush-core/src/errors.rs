use codepush_core_types::RequestId;
use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and responses from the upload layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Upload validation
    /// Required field or file missing from a release request
    UploadMalformed,
    /// Uploaded content is not a recognized archive type
    UnsupportedFormat,
    /// Bundle's detected platform disagrees with the declared target
    PlatformMismatch,
    /// Candidate content equals the version's current release
    DuplicateRelease,

    // Lookup
    NotFound,
    InvalidArgument,
    /// Manifest file missing, not JSON, or not a path -> hash object
    InvalidManifest,

    // Collaborators
    Storage,
    Network,
    /// Best-effort audit write failed (logged, never propagated)
    HistoryWrite,

    // Integration/IO
    Io,
    Serialization,
    Persistence,
    Concurrency,
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::UploadMalformed => "ERR_UPLOAD_MALFORMED",
            ExErrorKind::UnsupportedFormat => "ERR_UNSUPPORTED_FORMAT",
            ExErrorKind::PlatformMismatch => "ERR_PLATFORM_MISMATCH",
            ExErrorKind::DuplicateRelease => "ERR_DUPLICATE_RELEASE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ExErrorKind::InvalidManifest => "ERR_INVALID_MANIFEST",
            ExErrorKind::Storage => "ERR_STORAGE",
            ExErrorKind::Network => "ERR_NETWORK",
            ExErrorKind::HistoryWrite => "ERR_HISTORY_WRITE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether this kind is an expected, user-facing rejection rather than a
    /// system fault.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ExErrorKind::UploadMalformed
                | ExErrorKind::UnsupportedFormat
                | ExErrorKind::PlatformMismatch
                | ExErrorKind::DuplicateRelease
                | ExErrorKind::NotFound
                | ExErrorKind::InvalidArgument
        )
    }
}

/// Canonical structured error type
///
/// Carries classification fields for programmatic handling and rich context
/// for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (package id, deployment id, content hash)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Create an IO error for the given operation
pub fn io_error(op: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(op.to_string())
        .with_message(err.to_string())
}

/// Create a serialization error for the given operation
pub fn serialization_error(op: &str, err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Serialization)
        .with_op(op.to_string())
        .with_message(err.to_string())
}

// ========== End Error Facility ==========

/// Domain-level release errors
///
/// Raised by validation code that knows *what* went wrong in release terms;
/// converted into `ExError` at API boundaries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReleaseError {
    /// A required upload field or file is absent
    #[error("upload info lack: missing {field}")]
    MissingUploadField { field: String },

    /// `packageInfo` was present but not valid JSON of the expected shape
    #[error("upload info malformed: {reason}")]
    MalformedPackageInfo { reason: String },

    /// Upload content type is not a zip archive
    #[error("unsupported upload content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// Declared platform tag is not recognized
    #[error("{tag} does not support")]
    UnsupportedPlatform { tag: String },

    /// Detected bundle platform differs from the declared one
    #[error("it must be published by {detected} type, not {declared}")]
    PlatformMismatch { declared: String, detected: String },

    /// Candidate content equals the current release
    #[error("The uploaded package is identical to the contents of the specified deployment's current release.")]
    Duplicate {
        deployment_id: i64,
        app_version: String,
    },

    /// Deployment does not exist
    #[error("Deployment not found: {deployment_id}")]
    DeploymentNotFound { deployment_id: i64 },

    /// Package does not exist
    #[error("can't find Package {package_id}")]
    PackageNotFound { package_id: i64 },
}

impl From<ReleaseError> for ExError {
    fn from(err: ReleaseError) -> Self {
        let message = err.to_string();
        match err {
            ReleaseError::MissingUploadField { field } => {
                ExError::new(ExErrorKind::UploadMalformed)
                    .with_entity_id(field)
                    .with_message(message)
            }
            ReleaseError::MalformedPackageInfo { .. } => {
                ExError::new(ExErrorKind::UploadMalformed).with_message(message)
            }
            ReleaseError::UnsupportedContentType { .. } => {
                ExError::new(ExErrorKind::UnsupportedFormat).with_message(message)
            }
            ReleaseError::UnsupportedPlatform { tag } => ExError::new(ExErrorKind::InvalidArgument)
                .with_entity_id(tag)
                .with_message(message),
            ReleaseError::PlatformMismatch { .. } => {
                ExError::new(ExErrorKind::PlatformMismatch).with_message(message)
            }
            ReleaseError::Duplicate { deployment_id, .. } => {
                ExError::new(ExErrorKind::DuplicateRelease)
                    .with_entity_id(deployment_id.to_string())
                    .with_message(message)
            }
            ReleaseError::DeploymentNotFound { deployment_id } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_entity_id(deployment_id.to_string())
                    .with_message(message)
            }
            ReleaseError::PackageNotFound { package_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(package_id.to_string())
                .with_message(message),
        }
    }
}
