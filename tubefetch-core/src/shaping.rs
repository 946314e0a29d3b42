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
//! Pure functions that turn a raw [`Manifest`] into the lists shown to the user

use std::collections::HashSet;

use crate::{AudioDescriptor, AudioQuality, Manifest, RawStream, StreamSet, VideoDescriptor, VideoMetadata};

pub const HIGH_QUALITY_KBPS: u32 = 128;
pub const MEDIUM_QUALITY_KBPS: u32 = 64;
pub const DESCRIPTION_PREVIEW_CHARS: usize = 300;

pub fn classify_audio(kbps: u32) -> AudioQuality {
    if kbps >= HIGH_QUALITY_KBPS {
        AudioQuality::High
    } else if kbps >= MEDIUM_QUALITY_KBPS {
        AudioQuality::Medium
    } else {
        AudioQuality::Low
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rounded_kbps(bitrate: f64) -> u32 {
    bitrate.max(0.).round() as u32
}

/// Audio-only streams with a known bitrate, strictly descending by bitrate.
///
/// Streams that round to the same kbps value as a previous one are dropped.
pub fn audio_descriptors(streams: &[RawStream]) -> Vec<AudioDescriptor> {
    let mut audio: Vec<(&RawStream, f64)> = streams.iter()
        .filter(|s| s.is_audio_only())
        .filter_map(|s| s.audio_bitrate.map(|b| (s, b)))
        .collect();
    audio.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut result: Vec<AudioDescriptor> = Vec::with_capacity(audio.len());
    for (stream, bitrate) in audio {
        let kbps = rounded_kbps(bitrate);
        if result.last().is_some_and(|last| last.bitrate_kbps == kbps) {
            continue;
        }
        result.push(AudioDescriptor {
            id: stream.id.clone(),
            quality: classify_audio(kbps),
            bitrate_kbps: kbps,
            size: stream.filesize,
        });
    }
    result
}

/// Video streams with a known resolution, one per resolution, strictly descending.
///
/// Progressive streams take precedence over adaptive ones of the same resolution.
pub fn video_descriptors(streams: &[RawStream]) -> Vec<VideoDescriptor> {
    let by_resolution_desc = |filter: fn(&RawStream) -> bool| {
        let mut set: Vec<(&RawStream, u32)> = streams.iter()
            .filter(|s| filter(s))
            .filter_map(|s| s.height.map(|h| (s, h)))
            .collect();
        set.sort_by(|a, b| b.1.cmp(&a.1));
        set
    };
    let progressive = by_resolution_desc(RawStream::is_progressive);
    let adaptive = by_resolution_desc(RawStream::is_adaptive_video);

    let mut seen = HashSet::new();
    let mut result: Vec<VideoDescriptor> = progressive.into_iter().chain(adaptive)
        .filter(|(_, height)| seen.insert(*height))
        .map(|(stream, height)| VideoDescriptor {
            id: stream.id.clone(),
            resolution: height,
            fps: stream.fps,
            mime_type: stream.mime_type.clone(),
            size: stream.filesize,
        })
        .collect();
    result.sort_by(|a, b| b.resolution.cmp(&a.resolution));
    result
}

pub fn truncate_description(description: Option<&str>) -> String {
    match description {
        None | Some("") => String::new(),
        Some(desc) => {
            let mut preview: String = desc.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
            preview.push_str("...");
            preview
        },
    }
}

pub fn describe(manifest: &Manifest) -> VideoMetadata {
    VideoMetadata {
        title: manifest.title.clone(),
        author: manifest.author.clone(),
        length_secs: manifest.length_secs,
        thumbnail_url: manifest.thumbnail_url.clone(),
        description: truncate_description(manifest.description.as_deref()),
        view_count: manifest.view_count,
        publish_date: manifest.publish_date,
        streams: StreamSet {
            audio: audio_descriptors(&manifest.streams),
            video: video_descriptors(&manifest.streams),
        },
    }
}
