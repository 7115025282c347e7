use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key: set GEMINI_API_KEY or API_KEY")]
    MissingApiKey,

    #[error("request to the model failed: {0}")]
    Transport(String),

    #[error("model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("invalid {feature} response from the model: {detail}")]
    InvalidResponse {
        feature: &'static str,
        detail: String,
    },

    #[error("could not extract a valid Mermaid diagram from the model's response")]
    NoDiagram,

    #[error("{0}")]
    Precondition(String),
}

impl GenerationError {
    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::MissingApiKey => {
                "The AI model is not configured: no API key is set.".into()
            }
            GenerationError::Transport(_)
            | GenerationError::Api { .. }
            | GenerationError::EmptyResponse => "Failed to get a response from the AI model.".into(),
            GenerationError::InvalidResponse { feature, .. } => format!(
                "Could not parse the {feature} from the AI. The response might be invalid. Please try again."
            ),
            GenerationError::NoDiagram => {
                "Could not extract a valid Mermaid diagram from the AI's response.".into()
            }
            GenerationError::Precondition(msg) => msg.clone(),
        }
    }

    /// True for failures of the remote call itself, as opposed to its content.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GenerationError::MissingApiKey
                | GenerationError::Transport(_)
                | GenerationError::Api { .. }
                | GenerationError::EmptyResponse
        )
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        GenerationError::Transport(e.to_string())
    }
}
