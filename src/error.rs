//! CLI Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("database operation failed")]
    Database,
    #[display("could not fetch live metadata")]
    Probe,
    /// A `--map` argument that isn't `ORIGINAL=ALIAS`.
    #[display("invalid host mapping {_0:?}; expected ORIGINAL=ALIAS")]
    InvalidMapping(#[error(not(source))] String),
    #[display("failed writing report")]
    Output,
}
