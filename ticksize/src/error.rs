use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TickSizeError {
    #[error("price must be non-negative, got {0}")]
    NegativePrice(i64),
}
