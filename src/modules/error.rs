use thiserror::Error;

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    // destination unreachable or credentials rejected, url is already redacted
    #[error("cannot connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("unsupported database url `{0}`, expected sqlite:, mysql:// or mariadb://")]
    UnsupportedScheme(String),

    #[error("line {line}: missing required column `{column}`")]
    MissingField { column: String, line: u64 },

    #[error("line {line}: cannot parse price of product {product_id}: {reason}")]
    PriceParse {
        product_id: String,
        line: u64,
        reason: String,
    },

    #[error("line {line}: product {product_id} has no color and the vendor defines no fallback")]
    MissingColor { product_id: String, line: u64 },

    #[error("unknown vendor `{0}`, known vendors: {1}")]
    UnknownVendor(String, String),

    #[error("invalid table name `{0}`")]
    InvalidTable(String),

    #[error("preview declined, nothing was ingested")]
    PreviewDeclined,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
