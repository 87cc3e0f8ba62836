use thiserror::Error;

pub type Result<T> = std::result::Result<T, ComparisonError>;

/// The single fatal signal raised by the comparison engine.
///
/// Anything that reaches this type aborts widget setup. Out-of-range pointer
/// input never does; it is clamped where it arrives.
#[derive(Debug, Error)]
pub enum ComparisonError {
    /// Required initialization data (orientation, an image, a dimension) is absent.
    #[error("missing initialization data: {0}")]
    MissingData(String),

    /// One of the two images could not be decoded.
    #[error("failed to decode {side} image from {source_name}")]
    Decode {
        side: &'static str,
        source_name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("The URL is malformed.")]
    MalformedUrl,

    /// The API answered with an error status.
    #[error("{}", .0.message())]
    Api(ApiStatus),

    /// Transport or payload failure while talking to the API.
    #[error("The API request failed.")]
    Request(#[source] anyhow::Error),

    #[error("invalid orientation flag {0:?}")]
    InvalidOrientation(String),

    #[error("unsupported label corner {0:?}")]
    UnsupportedCorner(String),
}

/// Error statuses the juxtapose API is known to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    InvalidUrl,
    Expired,
    ServerError,
}

impl ApiStatus {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            400 => Some(Self::InvalidUrl),
            404 => Some(Self::Expired),
            500 => Some(Self::ServerError),
            _ => None,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidUrl => "The URL is invalid.",
            Self::Expired => "The juxtapose message was deleted and the images expired.",
            Self::ServerError => "The API request could not be processed.",
        }
    }
}

impl ComparisonError {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingData(what.into())
    }

    /// Contract violations by the caller, as opposed to bad input data.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidOrientation(_) | Self::UnsupportedCorner(_)
        )
    }
}
