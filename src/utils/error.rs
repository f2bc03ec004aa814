use thiserror::Error;

/// Failures while logging in or scraping one company's statement.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: reqwest::StatusCode },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Anti-forgery token `{field}` not found on login page")]
    TokenMissing { field: String },

    #[error("Login failed: expected to land on {expected}, got {actual}")]
    LoginFailed { expected: String, actual: String },

    #[error("Section `{title}` not found")]
    SectionNotFound { title: String },

    #[error("No table after section `{title}`")]
    TableNotFound { title: String },

    #[error("Row `{category}` has {actual} values for {expected} periods")]
    ShapeMismatch { category: String, expected: usize, actual: usize },

    #[error("Bad selector {0}")]
    Selector(String),
}

/// Any failure while moving the CSV artifact into the store.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV artifact {0} has no header row")]
    EmptyHeader(String),

    #[error("Database error: {0}")]
    Db(#[from] duckdb::Error),

    #[error("Unsupported store scheme `{0}`")]
    UnsupportedScheme(String),
}
