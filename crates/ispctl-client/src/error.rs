use ispctl_channel::ChannelError;

/// Errors that can occur in typed feature operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The underlying control-channel transaction failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A verified write was not applied by the driver.
    ///
    /// Only produced in [`verify_writes`] mode.
    ///
    /// [`verify_writes`]: crate::FeatureClient::with_verify_writes
    #[error("{op}: write not applied (expected {expected}, driver reports {actual})")]
    VerifyFailed {
        op: &'static str,
        expected: String,
        actual: String,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;
