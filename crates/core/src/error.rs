/// Errors raised while validating job input or process configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The value was present but had the wrong shape or type. The
    /// message is caller-facing and returned verbatim in job results.
    #[error("{0}")]
    Validation(String),
}
