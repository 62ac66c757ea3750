use exchange_tester::ExchangeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Catalog with data for import was not provided")]
    CatalogNotProvided,

    #[error(transparent)]
    ExchangeError(#[from] ExchangeError),
}
