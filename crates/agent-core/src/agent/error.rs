use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    /// The provider could not be reached, rejected the request, or broke the stream.
    #[error("Provider transport error: {0}")]
    ProviderTransport(String),

    #[error("Cancelled")]
    Cancelled,
}
