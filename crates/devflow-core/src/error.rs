use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevflowError {
    #[error("not initialized: run 'devflow init'")]
    NotInitialized,

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("invalid task status '{0}': expected pending, in-progress or done")]
    InvalidTaskStatus(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("Deployment failed: No HTML file found in the project.")]
    NoEntryDocument,

    #[error("preview rewrite failed: {0}")]
    Preview(String),

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("not signed in")]
    Unauthorized,

    #[error("action already running: {0}")]
    AlreadyRunning(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DevflowError>;
