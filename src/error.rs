use adaptive_screen::ScreenError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngraveError>;

#[derive(Debug, Error)]
pub enum EngraveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{first} and {second} are mutually exclusive options")]
    ConflictingOptions {
        first: &'static str,
        second: &'static str,
    },

    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line}. Image stream suddenly closed")]
    ShortRead { line: u32 },

    #[error("Stage {stage} ({name}) failed: {status}")]
    StageFailed {
        stage: usize,
        name: String,
        status: String,
    },

    #[error("Can't start stage {stage} ({program}): {source}")]
    StageSpawn {
        stage: usize,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Stage {stage} did not finish within {seconds} s")]
    Timeout { stage: usize, seconds: u64 },

    #[error("Screening error: {0}")]
    Screen(ScreenError),

    #[error("Stream error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("PNG encode error: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("PNG decode error: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("Config file error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl EngraveError {
    /// Attach what was being done to an I/O failure.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        EngraveError::Io {
            context: context.into(),
            source,
        }
    }

    /// Errors raised before any stage is started.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            EngraveError::Config(_) | EngraveError::ConflictingOptions { .. }
        )
    }
}

impl From<ScreenError> for EngraveError {
    fn from(e: ScreenError) -> Self {
        match e {
            ScreenError::Allocation { .. } => EngraveError::Resource(e.to_string()),
            ScreenError::InvalidOption { .. } => EngraveError::Config(e.to_string()),
            other => EngraveError::Screen(other),
        }
    }
}
