use pyo3::exceptions::PyRuntimeError;
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FootprintError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    General(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),
}

impl From<FootprintError> for PyErr {
    fn from(err: FootprintError) -> PyErr {
        PyRuntimeError::new_err(err.to_string())
    }
}

impl From<PyErr> for FootprintError {
    fn from(err: PyErr) -> Self {
        FootprintError::General(err.to_string())
    }
}
