#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Calculation failed: {0}")]
    Calculation(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),
}
