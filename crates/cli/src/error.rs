use connectors::error::ConnectorError;
use engine_core::{error::FetchError, settings::SettingsError};
use model::pagination::error::{InvalidOrderError, MalformedCursorError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read the settings file: {0}")]
    SettingsFileRead(#[from] std::io::Error),

    #[error("Invalid pagination settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Invalid ordering: {0}")]
    Order(#[from] InvalidOrderError),

    #[error("Invalid cursor: {0}")]
    Cursor(#[from] MalformedCursorError),

    #[error("Failed to open the source: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Failed to fetch a page: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Unsupported SQL dialect: {0}")]
    UnsupportedDialect(String),
}
