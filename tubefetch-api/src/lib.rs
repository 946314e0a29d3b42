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
//! JSON bodies exchanged with the TubeFetch server

use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct VideoInfoRequest {
    pub url: Option<String>,
}

/// Stream ids are numeric itags on the platform side, but clients may send them either way
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum StreamIdInput {
    Number(u64),
    Text(String),
}

impl Display for StreamIdInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamIdInput::Number(n) => write!(f, "{n}"),
            StreamIdInput::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DownloadRequest {
    pub url: Option<String>,
    pub itag: Option<StreamIdInput>,
    /// `audio` or `video`, defaults to `audio`
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiAudioStream {
    pub itag: Arc<str>,
    #[serde(rename = "type")]
    pub kind: Arc<str>,
    pub format: Arc<str>,
    pub quality: Arc<str>,
    pub bitrate: String,
    pub size: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiVideoStream {
    pub itag: Arc<str>,
    #[serde(rename = "type")]
    pub kind: Arc<str>,
    pub format: Arc<str>,
    pub quality: String,
    pub fps: Option<f64>,
    pub mime_type: Arc<str>,
    pub size: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ApiStreams {
    pub audio: Vec<ApiAudioStream>,
    pub video: Vec<ApiVideoStream>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiVideoInfo {
    pub title: Arc<str>,
    pub author: Arc<str>,
    /// seconds
    pub length: u64,
    pub thumbnail_url: Option<Arc<str>>,
    pub description: String,
    pub view_count: Option<u64>,
    /// `YYYY-MM-DD`
    pub publish_date: Option<String>,
    pub streams: ApiStreams,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VideoInfoResponse {
    pub success: bool,
    pub data: ApiVideoInfo,
}

impl VideoInfoResponse {
    pub fn new(data: ApiVideoInfo) -> Self {
        Self { success: true, data }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DownloadResponse {
    pub success: bool,
    pub download_url: String,
}

impl DownloadResponse {
    pub fn new(download_url: String) -> Self {
        Self { success: true, download_url }
    }
}

/// Body of every failed request
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: Arc<str>,
}

impl ErrorResponse {
    pub fn new<T: Into<Arc<str>>>(error: T) -> Self {
        Self { success: false, error: error.into() }
    }
}

#[cfg(feature = "tubefetch-core")]
mod from_core {
    use tubefetch_core::{format_size, AudioDescriptor, StreamKind, VideoDescriptor, VideoMetadata};

    use super::*;

    impl From<&AudioDescriptor> for ApiAudioStream {
        fn from(value: &AudioDescriptor) -> Self {
            let quality: &'static str = value.quality.into();
            Self {
                itag: value.id.clone(),
                kind: StreamKind::Audio.to_string().into(),
                format: StreamKind::Audio.container().into(),
                quality: quality.into(),
                bitrate: format!("{}kbps", value.bitrate_kbps),
                size: format_size(value.size),
            }
        }
    }

    impl From<&VideoDescriptor> for ApiVideoStream {
        fn from(value: &VideoDescriptor) -> Self {
            Self {
                itag: value.id.clone(),
                kind: StreamKind::Video.to_string().into(),
                format: StreamKind::Video.container().into(),
                quality: format!("{}p", value.resolution),
                fps: value.fps,
                mime_type: value.mime_type.clone(),
                size: format_size(value.size),
            }
        }
    }

    impl From<&VideoMetadata> for ApiVideoInfo {
        fn from(value: &VideoMetadata) -> Self {
            Self {
                title: value.title.clone(),
                author: value.author.clone(),
                length: value.length_secs,
                thumbnail_url: value.thumbnail_url.clone(),
                description: value.description.clone(),
                view_count: value.view_count,
                publish_date: value.publish_date.map(|d| d.format("%Y-%m-%d").to_string()),
                streams: ApiStreams {
                    audio: value.streams.audio.iter().map(Into::into).collect(),
                    video: value.streams.video.iter().map(Into::into).collect(),
                },
            }
        }
    }
}
