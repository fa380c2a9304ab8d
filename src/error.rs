use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedbackError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage failure: {0}")]
    Storage(#[from] DbErr),

    #[error("csv export failed: {0}")]
    Export(#[from] csv::Error),
}
