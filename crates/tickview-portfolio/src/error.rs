//! Portfolio error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error(transparent)]
    Core(#[from] tickview_core::CoreError),
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;
