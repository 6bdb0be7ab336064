use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("invalid date range: {0}")]
    Validation(String),
}
