//! Error types for store, parser and service operations.

use thiserror::Error;

use crate::domain::ItemId;

pub type StoreResult<T> = Result<T, StoreError>;
pub type ParserResult<T> = Result<T, ParserError>;
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures talking to the schedule store
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("permission denied: {0}")]
    Permission(String),
    #[error("schedule {0} not found")]
    NotFound(ItemId),
    #[error("invalid store response: {0}")]
    InvalidResponse(String),
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Failures talking to the text/image parser
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParserError {
    #[error("network error: {0}")]
    Network(String),
    #[error("parser API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("parser returned no text")]
    EmptyResponse,
    #[error("parser unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced to the UI by the schedule service
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
