/// Errors produced by the `arcade-core` crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A user id could not be parsed or validated.
    #[error("invalid user id: {reason}")]
    InvalidUserId { reason: String },
}
