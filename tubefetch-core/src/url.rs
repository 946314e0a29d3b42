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

use std::{fmt::Display, sync::{Arc, LazyLock}};

use regex::Regex;

use crate::{FetchError, INVALID_URL_MSG};

// watch, embed, v/ and short link forms, with an 11 character video id
static VIDEO_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(
    r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%\?]{11})"
).expect("Should be able to parse the video URL regex"));

/// A URL that passed validation
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VideoUrl {
    url: Arc<str>,
    video_id: Arc<str>,
}

impl VideoUrl {
    pub fn parse(url: &str) -> Result<VideoUrl, FetchError> {
        let Some(captures) = VIDEO_URL_REGEX.captures(url) else {
            return Err(FetchError::invalid_input(INVALID_URL_MSG));
        };
        Ok(VideoUrl {
            url: url.into(),
            video_id: captures[6].into(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

impl Display for VideoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Validates a candidate URL, treating a missing value the same as a malformed one
pub fn validate(url: Option<&str>) -> Result<VideoUrl, FetchError> {
    match url {
        Some(url) => VideoUrl::parse(url.trim()),
        None => Err(FetchError::invalid_input(INVALID_URL_MSG)),
    }
}
