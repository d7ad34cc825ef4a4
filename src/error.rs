use thiserror::Error;

/// Errors raised by the clustering core and the determinant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KMeansError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A center attracted no points and the policy forbids carrying it forward.
    #[error("cluster {label} has no assigned points")]
    EmptyCluster { label: usize },
}

pub type Result<T> = std::result::Result<T, KMeansError>;

impl KMeansError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        KMeansError::InvalidArgument(msg.into())
    }
}
