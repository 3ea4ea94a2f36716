// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Error taxonomy of the manager.
//!
//! Every failure maps to one of these kinds and from there to an HTTP
//! status. Recoverable failures inside a fan-out never surface here; they
//! ride on the per-item error fields of the response instead.

use dropshot::HttpError;
use thiserror::Error;

use crate::broker::BrokerError;
use kvstore::{SelectorError, StoreError};

/// Service error kinds.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed id, missing field, invalid zone, CIDR violation. 400.
    #[error("{0}")]
    Validation(String),

    /// Entity absent from the store or the broker. 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate id, or deletion of an in-use resource. 409.
    #[error("{0}")]
    Conflict(String),

    /// Non-2xx from the broker, message propagated. 502.
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    /// A class timeout or an endpoint deadline was exceeded. 504.
    #[error("{0}")]
    Timeout(String),

    /// A path budget was exhausted. 429.
    #[error("{0}")]
    RateLimited(String),

    /// Credential envelope decryption failed. 400.
    #[error("{0}")]
    Crypto(String),

    /// Store failure, marshalling failure, invariant violation. 500.
    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<SelectorError> for ApiError {
    fn from(e: SelectorError) -> Self {
        match e {
            SelectorError::InvalidClause(_) | SelectorError::UnknownOperator(_) => {
                ApiError::Validation(e.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Internal(format!("marshalling failure: {e}"))
    }
}

fn server_error(status: dropshot::ErrorStatusCode, message: String) -> HttpError {
    let mut err = HttpError::for_internal_error(message.clone());
    err.status_code = status;
    err.external_message = message;
    err
}

impl From<ApiError> for HttpError {
    fn from(e: ApiError) -> Self {
        let message = e.to_string();
        match e {
            ApiError::Validation(_) | ApiError::Crypto(_) => {
                HttpError::for_bad_request(None, message)
            }
            ApiError::NotFound(_) => HttpError::for_not_found(None, message),
            ApiError::Conflict(_) => HttpError::for_client_error(
                None,
                dropshot::ClientErrorStatusCode::CONFLICT,
                message,
            ),
            ApiError::RateLimited(_) => HttpError::for_client_error(
                None,
                dropshot::ClientErrorStatusCode::TOO_MANY_REQUESTS,
                message,
            ),
            ApiError::Broker(BrokerError::Timeout(_)) | ApiError::Timeout(_) => {
                server_error(dropshot::ErrorStatusCode::GATEWAY_TIMEOUT, message)
            }
            ApiError::Broker(_) => server_error(dropshot::ErrorStatusCode::BAD_GATEWAY, message),
            ApiError::Internal(_) => HttpError::for_internal_error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases: Vec<(ApiError, u16)> = vec![
            (ApiError::Validation("bad name".into()), 400),
            (ApiError::Crypto("unpad failed".into()), 400),
            (ApiError::NotFound("vNet vnet1".into()), 404),
            (ApiError::Conflict("already exists".into()), 409),
            (ApiError::RateLimited("budget".into()), 429),
            (ApiError::Internal("marshal".into()), 500),
            (
                ApiError::Broker(BrokerError::Api {
                    status: 500,
                    message: "driver not found".into(),
                }),
                502,
            ),
            (
                ApiError::Broker(BrokerError::Timeout("vpc create".into())),
                504,
            ),
            (ApiError::Timeout("status fan-out".into()), 504),
        ];
        for (err, want) in cases {
            let http: HttpError = err.into();
            assert_eq!(http.status_code.as_u16(), want);
        }
    }

    #[test]
    fn broker_message_is_propagated() {
        let err = ApiError::Broker(BrokerError::Api {
            status: 404,
            message: "vpc not found".into(),
        });
        let http: HttpError = err.into();
        assert!(http.external_message.contains("vpc not found"));
        assert!(http.external_message.starts_with("broker error"));
    }
}
