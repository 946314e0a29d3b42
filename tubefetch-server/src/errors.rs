/* This file is part of the TubeFetch project
*
*  Copyright (C) 2025 TubeFetch contributors
*  
*  This program is free software: you can redistribute it and/or modify
*  it under the terms of the GNU Affero General Public License as published by
*  the Free Software Foundation, either version 3 of the License, or
*  (at your option) any later version.
*
*  This program is distributed in the hope that it will be useful,
*  but WITHOUT ANY WARRANTY; without even the implied warranty of
*  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
*  GNU Affero General Public License for more details.
*
*  You should have received a copy of the GNU Affero General Public License
*  along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
use std::{fmt::{Debug, Display}, sync::Arc};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use cloneable_errors::ErrorContext;
use tubefetch_api::ErrorResponse;
use tubefetch_core::FetchError;

pub const GENERIC_ERROR_MSG: &str = "An unexpected error occurred";
pub const GENERIC_DOWNLOAD_ERROR_MSG: &str = "An unexpected error occurred during download";
pub const FILE_NOT_FOUND_MSG: &str = "File not found";
pub const PAYLOAD_TOO_LARGE_MSG: &str = "File too large";
pub const INVALID_BODY_MSG: &str = "Invalid request body";
pub const INVALID_KIND_MSG: &str = "Invalid download type";

/// This extension will be present on a response if the response contains
/// an [`ErrorResponse`] encoded as json
pub struct ApiErrorMarker;

/// An error reported to the client as `{"success": false, "error": ...}`
///
/// The cause, if any, is only ever logged.
pub struct Error {
    status: StatusCode,
    message: Arc<str>,
    cause: Option<ErrorContext>,
}

impl Error {
    pub fn new<T: Into<Arc<str>>>(status: StatusCode, message: T) -> Error {
        Error { status, message: message.into(), cause: None }
    }

    pub fn bad_request<T: Into<Arc<str>>>(message: T) -> Error {
        Error::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Error {
        Error::new(StatusCode::NOT_FOUND, FILE_NOT_FOUND_MSG)
    }

    /// 500 with a generic message, hiding the cause
    pub fn internal(message: &'static str, cause: ErrorContext) -> Error {
        Error { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into(), cause: Some(cause) }
    }

    /// Maps a core failure to a response.
    ///
    /// Client errors keep their own message, everything else is replaced by `generic`.
    pub fn from_fetch(err: FetchError, generic: &'static str) -> Error {
        match err {
            FetchError::InvalidInput(msg) => Error::bad_request(msg),
            err @ FetchError::FormatUnavailable { .. } => Error::bad_request(err.to_string()),
            FetchError::Extraction(cause) | FetchError::Io(cause) => Error::internal(generic, cause),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.cause {
            Some(ref cause) => write!(f, "{} ({}): {cause:?}", self.message, self.status),
            None => write!(f, "{} ({})", self.message, self.status),
        }
    }
}
impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.message, f)
    }
}
impl std::error::Error for Error {}
impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status);
        builder.extensions_mut().insert(ApiErrorMarker);
        builder.json(ErrorResponse::new(self.message.clone()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
