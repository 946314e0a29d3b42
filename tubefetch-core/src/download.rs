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

use std::{path::{Path, PathBuf}, sync::Arc};

use chrono::{Local, NaiveDateTime};
use cloneable_errors::ErrContext;
use log::{debug, error, info};
use tokio::fs;

use crate::{filename::sanitize_filename, shaping, FetchError, ProgressSender, StreamKind, VideoMetadata, VideoSource, VideoUrl};

pub const DOWNLOAD_ROUTE: &str = "/download";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadResult {
    pub path: PathBuf,
    pub file_name: String,
}

impl DownloadResult {
    /// Public URL the file is served under
    pub fn download_url(&self) -> String {
        format!("{DOWNLOAD_ROUTE}/{}", self.file_name)
    }
}

/// Ties a [`VideoSource`] to the directory downloads are written to
pub struct Downloader {
    source: Arc<dyn VideoSource>,
    download_dir: PathBuf,
}

impl Downloader {
    pub fn new(source: Arc<dyn VideoSource>, download_dir: PathBuf) -> Downloader {
        Downloader { source, download_dir }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Looks up a video and shapes its stream lists for display
    pub async fn video_info(&self, url: &VideoUrl) -> Result<VideoMetadata, FetchError> {
        match self.source.fetch_manifest(url).await {
            Ok(manifest) => Ok(shaping::describe(&manifest)),
            Err(err) => {
                error!("Error getting video info from {}: {err:?}", self.source.name());
                Err(err)
            },
        }
    }

    pub async fn download(&self, url: &VideoUrl, stream_id: &str, kind: StreamKind, progress: ProgressSender) -> Result<DownloadResult, FetchError> {
        self.download_at(url, stream_id, kind, progress, Local::now().naive_local()).await
    }

    /// [`Downloader::download`] with an explicit timestamp for the file name
    pub async fn download_at(&self, url: &VideoUrl, stream_id: &str, kind: StreamKind, progress: ProgressSender, timestamp: NaiveDateTime) -> Result<DownloadResult, FetchError> {
        let result = self.try_download(url, stream_id, kind, progress, timestamp).await;
        match result {
            Ok(ref res) => info!("Successfully downloaded: {}", res.file_name),
            Err(ref err) if err.is_client_error() => info!("Download of stream {stream_id} from {url} rejected: {err}"),
            Err(ref err) => error!("Download error: {err:?}"),
        }
        result
    }

    async fn try_download(&self, url: &VideoUrl, stream_id: &str, kind: StreamKind, progress: ProgressSender, timestamp: NaiveDateTime) -> Result<DownloadResult, FetchError> {
        // ids are only valid for the manifest they came from, so look the stream up again
        let manifest = self.source.fetch_manifest(url).await?;
        let Some(stream) = manifest.stream_by_id(stream_id) else {
            return Err(FetchError::FormatUnavailable { stream_id: stream_id.into() });
        };

        let quality_suffix = stream.resolution().map(|r| format!("_{r}")).unwrap_or_default();
        let name = format!("{}{quality_suffix}{}", manifest.title, kind.default_extension());
        let file_name = sanitize_filename(&name, kind, timestamp);
        let path = self.download_dir.join(&file_name);

        // the directory is only created at startup and may have been removed since
        fs::create_dir_all(&self.download_dir).await
            .map_err(|e| FetchError::Io(e.context(format!("Failed to create the download directory {}", self.download_dir.display()))))?;
        debug!("Saving stream {stream_id} of video {} to {}", manifest.video_id, path.display());
        self.source.download(url, stream, &path, progress).await?;
        Ok(DownloadResult { path, file_name })
    }
}
