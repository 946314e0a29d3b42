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

use std::{error::Error, fmt::Display, sync::Arc};

use cloneable_errors::ErrorContext;

pub const INVALID_URL_MSG: &str = "Invalid YouTube URL format";
pub const FORMAT_UNAVAILABLE_MSG: &str = "Selected format is not available";

#[derive(Debug, Clone)]
pub enum FetchError {
    /// The request itself was malformed, the message is safe to show to the user
    InvalidInput(Arc<str>),
    /// The extractor failed to resolve or transfer the video
    Extraction(ErrorContext),
    /// The requested stream id is not present in the current manifest
    FormatUnavailable {
        stream_id: Arc<str>,
    },
    /// Local filesystem failure
    Io(ErrorContext),
}

impl FetchError {
    pub fn invalid_input<T: Into<Arc<str>>>(msg: T) -> FetchError {
        FetchError::InvalidInput(msg.into())
    }

    /// Whether the failure was caused by the request rather than by the server or the platform
    pub fn is_client_error(&self) -> bool {
        matches!(self, FetchError::InvalidInput(..) | FetchError::FormatUnavailable { .. })
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::InvalidInput(msg) => write!(f, "{msg}"),
            FetchError::Extraction(err) => write!(f, "Extraction failed: {err}"),
            FetchError::FormatUnavailable { .. } => write!(f, "{FORMAT_UNAVAILABLE_MSG}"),
            FetchError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FetchError::Extraction(err) | FetchError::Io(err) => Some(err),
            FetchError::InvalidInput(..) | FetchError::FormatUnavailable { .. } => None,
        }
    }
}
