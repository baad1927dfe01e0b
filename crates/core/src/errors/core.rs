use thiserror::Error;

/// Result alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type for the keel bootstrap runtime.
///
/// Wiring bugs (an unset type, a structural double-bind) are not represented
/// here; they panic at the point of misuse so a malformed registry can never
/// start serving. Everything selection-time or data-time comes back as one of
/// these variants and the surrounding bootstrap step decides what to do.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("global object not found for key '{key}'")]
    KeyNotFound { key: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("delegate for '{owner}' is not mounted; call mount_to_parent on the concrete instance before forwarding")]
    DelegateNotMounted { owner: String },

    #[error("delegate for '{owner}' resolves to the base instance itself")]
    SelfDelegation { owner: String },

    #[error("failed to load providers: {message}")]
    LoadFailed { message: String },

    #[error("lock error on resource: {resource}")]
    Lock { resource: String },

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a new key-not-found error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create a new conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new delegate-not-mounted error
    pub fn delegate_not_mounted(owner: impl Into<String>) -> Self {
        Self::DelegateNotMounted {
            owner: owner.into(),
        }
    }

    /// Create a new self-delegation error
    pub fn self_delegation(owner: impl Into<String>) -> Self {
        Self::SelfDelegation {
            owner: owner.into(),
        }
    }

    /// Create a new aggregate load failure
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::LoadFailed {
            message: message.into(),
        }
    }

    /// Create a new lock error
    pub fn lock(resource: impl Into<String>) -> Self {
        Self::Lock {
            resource: resource.into(),
        }
    }

    /// Check if the error is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Check if the error is a not-found error (selection or container key)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::KeyNotFound { .. })
    }

    /// Check if the error is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Check if the error is a delegation error
    pub fn is_delegation(&self) -> bool {
        matches!(
            self,
            Self::DelegateNotMounted { .. } | Self::SelfDelegation { .. }
        )
    }
}
