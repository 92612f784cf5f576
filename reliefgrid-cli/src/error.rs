//! CLI error type.

use std::fmt;

use reliefgrid::config::ConfigError;
use reliefgrid::heightmap::HeightmapError;
use reliefgrid::logging::LoggingError;
use reliefgrid::provider::ProviderError;
use reliefgrid::PipelineError;

/// Exit code used when the run was interrupted with Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

/// Errors surfaced to the command line.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem or invalid argument combination
    Config(String),
    /// Logging could not be initialized
    Logging(LoggingError),
    /// HTTP client setup failed
    Provider(ProviderError),
    /// Heightmap generation failed
    Pipeline(PipelineError),
    /// Writing an output file failed
    Output(String),
    /// Async runtime or signal handler setup failed
    Runtime(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Pipeline(e) if e.is_cancelled() => EXIT_INTERRUPTED,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Provider(e) => write!(f, "Tile provider error: {}", e),
            CliError::Pipeline(e) => write!(f, "{}", e),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        CliError::Provider(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<HeightmapError> for CliError {
    fn from(e: HeightmapError) -> Self {
        CliError::Output(e.to_string())
    }
}
