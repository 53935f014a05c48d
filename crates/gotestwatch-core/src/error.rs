use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("failed to run `{command}`: {message}")]
    Toolchain { command: String, message: String },

    #[error("the directory {0} is not within a Go module")]
    NotInModule(String),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Test executor error: {0}")]
    Executor(String),
}

impl WatchError {
    pub fn toolchain(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Toolchain {
            command: command.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
