//! Error types for cloudscale-converge

use thiserror::Error;

/// Result type alias using the cloudscale-converge Error
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is terminal for the current invocation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failure while calling the cloudscale.ch API with {method} for \"{path}\": HTTP {status}: {detail}")]
    Api {
        method: String,
        path: String,
        status: u16,
        detail: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(
        "More than one {kind} resource with '{key}' exists: {value}. \
         Use the '{id_key}' parameter to identify the resource."
    )]
    Ambiguous {
        kind: String,
        key: String,
        value: String,
        id_key: String,
    },

    #[error(
        "The {kind} resource with '{id_key}' {id} was not found and we would create a new one \
         with a different identity, this is probably not what you have asked for."
    )]
    IdentityNotFound {
        kind: String,
        id_key: String,
        id: String,
    },

    #[error("Unable to update {field} of {kind}, no href found.")]
    Unaddressable { kind: String, field: String },

    #[error(
        "Timeout while waiting for a state change on {kind} {name} to states {targets:?}. \
         Current state is {last}."
    )]
    Timeout {
        kind: String,
        name: String,
        targets: Vec<String>,
        last: String,
    },

    #[error("Timeout while waiting to find the {kind} {name}.")]
    NotFoundWhileWaiting { kind: String, name: String },

    #[error("{kind} with '{key}' not found: {value}")]
    NotFound {
        kind: String,
        key: String,
        value: String,
    },

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
