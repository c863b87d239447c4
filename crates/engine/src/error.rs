use landform_core::FormError;

/// Failure raised by a host field-store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field store backend error: {0}")]
    Backend(String),
}

/// Anything the coordinator reports to the host's reporter collaborator.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
