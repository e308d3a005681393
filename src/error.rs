use crate::table::Backend;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, std::fmt::Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index {index} is out of range for a table of {count} points")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("x = {x} at index {index} would break the strictly ascending order of abscissas")]
    OrderingViolation { index: usize, x: f64 },

    #[error("a point with x = {x} already exists")]
    DuplicateAbscissa { x: f64 },

    #[error("cannot delete from a table of {count} points, this backend keeps more than {floor}")]
    TooFewPointsToDelete { count: usize, floor: usize },

    #[error("the table contains no points")]
    EmptyState,

    #[error("`{0}` is not a registered tabulated function backend")]
    UnsupportedBackend(String),

    #[error("the {backend} backend has no `{signature}` constructor")]
    MissingConstructor {
        backend: Backend,
        signature: &'static str,
    },

    #[error("the {backend} backend failed to construct a table")]
    Construction {
        backend: Backend,
        #[source]
        source: Box<Error>,
    },

    #[error("malformed point stream: {0}")]
    Format(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
