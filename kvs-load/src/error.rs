use tonic::{Code, Status};

#[derive(thiserror::Error, Debug)]
pub enum KvsError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Unknown workload profile `{0}`")]
    UnknownProfile(String),
    #[error("Uri parsing error: {0}")]
    InvalidUrl(#[from] http::uri::InvalidUri),
    #[error("Cannot connect to `{addr}`: {source}")]
    Connect {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RPC Error: {0}")]
    Rpc(#[from] Status),
    #[error("RPC failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Status },
    #[error("Driver task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl KvsError {
    /// Whether another attempt of the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            KvsError::Rpc(status) => is_retryable_code(status.code()),
            _ => false,
        }
    }
}

fn is_retryable_code(code: Code) -> bool {
    matches!(
        code,
        Code::Unavailable
            | Code::DeadlineExceeded
            | Code::Aborted
            | Code::ResourceExhausted
            | Code::Unknown
            | Code::Internal
            | Code::Cancelled
    )
}

impl From<KvsError> for tonic::Status {
    fn from(value: KvsError) -> Self {
        match value {
            KvsError::InvalidConfig(msg) => Status::invalid_argument(msg),
            KvsError::UnknownProfile(_) => {
                Status::invalid_argument(value.to_string())
            }
            KvsError::Rpc(e) => e,
            KvsError::RetriesExhausted { last, .. } => last,
            _ => Status::internal(value.to_string()),
        }
    }
}
