use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unit index {index} is out of range for {n} units")]
    InvalidIndex { index: usize, n: usize },

    #[error("unit {index} is listed as its own neighbor")]
    SelfLoop { index: usize },

    #[error("unknown weights style {0:?} (expected \"B\" or \"W\")")]
    UnknownStyle(String),

    #[error("value vector has {actual} entries but the weights cover {expected} units")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("at least {required} units are required, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("all values are identical, autocorrelation is undefined")]
    ZeroVariance,

    #[error("every unit is isolated, the weights sum to zero")]
    NoNeighbors,

    #[error("analytic variance is not positive ({0})")]
    DegenerateVariance(f64),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("GAL parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
