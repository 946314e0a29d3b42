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

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString, strum::IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StreamKind {
    #[default]
    Audio,
    Video,
}

impl StreamKind {
    /// Container name advertised to clients for this kind of stream
    pub fn container(self) -> &'static str {
        match self {
            StreamKind::Audio => "mp3",
            StreamKind::Video => "mp4",
        }
    }

    pub fn default_extension(self) -> &'static str {
        match self {
            StreamKind::Audio => ".mp3",
            StreamKind::Video => ".mp4",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::IntoStaticStr)]
pub enum AudioQuality {
    High,
    Medium,
    Low,
}

/// A single stream as reported by the extractor, before any filtering or ordering
#[derive(Clone, Debug, PartialEq)]
pub struct RawStream {
    pub id: Arc<str>,
    pub container: Arc<str>,
    pub mime_type: Arc<str>,
    /// average audio bitrate in kbps
    pub audio_bitrate: Option<f64>,
    /// vertical resolution in pixels
    pub height: Option<u32>,
    pub fps: Option<f64>,
    /// exact or approximate size in bytes
    pub filesize: Option<u64>,
    pub has_audio: bool,
    pub has_video: bool,
}

impl RawStream {
    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }

    /// Muxed audio+video stream
    pub fn is_progressive(&self) -> bool {
        self.has_audio && self.has_video
    }

    /// Video-only stream that requires a separate audio track
    pub fn is_adaptive_video(&self) -> bool {
        self.has_video && !self.has_audio
    }

    /// Resolution label in the `720p` form
    pub fn resolution(&self) -> Option<String> {
        self.height.map(|h| format!("{h}p"))
    }
}

/// Everything the extractor knows about a single video
#[derive(Clone, Debug, PartialEq)]
pub struct Manifest {
    pub video_id: Arc<str>,
    pub title: Arc<str>,
    pub author: Arc<str>,
    pub length_secs: u64,
    pub thumbnail_url: Option<Arc<str>>,
    pub description: Option<Arc<str>>,
    pub view_count: Option<u64>,
    pub publish_date: Option<NaiveDate>,
    pub streams: Vec<RawStream>,
}

impl Manifest {
    pub fn stream_by_id(&self, id: &str) -> Option<&RawStream> {
        self.streams.iter().find(|s| &*s.id == id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AudioDescriptor {
    pub id: Arc<str>,
    pub quality: AudioQuality,
    pub bitrate_kbps: u32,
    pub size: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoDescriptor {
    pub id: Arc<str>,
    /// vertical resolution in pixels
    pub resolution: u32,
    pub fps: Option<f64>,
    pub mime_type: Arc<str>,
    pub size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamSet {
    pub audio: Vec<AudioDescriptor>,
    pub video: Vec<VideoDescriptor>,
}

/// Snapshot of a single info lookup
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub title: Arc<str>,
    pub author: Arc<str>,
    pub length_secs: u64,
    pub thumbnail_url: Option<Arc<str>>,
    /// already truncated for display
    pub description: String,
    pub view_count: Option<u64>,
    pub publish_date: Option<NaiveDate>,
    pub streams: StreamSet,
}

/// Formats a byte count the way the stream lists show it, ie. `12.3 MB`
#[allow(clippy::cast_precision_loss)]
pub fn format_size(size: Option<u64>) -> String {
    match size {
        Some(bytes) => format!("{:.1} MB", bytes as f64 / (1024. * 1024.)),
        None => "Unknown".to_owned(),
    }
}
