#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no free buffer to satisfy the request")]
    NoMemory,

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(&'static str),
}
