#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Shell channel closed")]
    ChannelClosed,

    #[error("Invalid thumbnail: {0}")]
    InvalidThumbnail(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("homepage '{url}' is not an absolute URL: {reason}")]
    InvalidHomepage { url: String, reason: String },

    #[error("search_url must not be empty")]
    EmptySearchUrl,

    #[error("thumbnail_max_dim must be at least 1")]
    ZeroThumbnailSize,

    #[error("event_channel_capacity must be at least 1")]
    ZeroChannelCapacity,

    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
