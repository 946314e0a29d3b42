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

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use futures::{channel::mpsc, StreamExt};
use log::info;

use crate::{FetchError, Manifest, RawStream, VideoUrl};

/// The external extractor that knows how to talk to the video platform
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Name of the extractor, for logging
    fn name(&self) -> &'static str;

    /// Resolves the video page and lists every stream it offers
    async fn fetch_manifest(&self, url: &VideoUrl) -> Result<Manifest, FetchError>;

    /// Writes the bytes of `stream` to `dest`, reporting progress as it goes
    async fn download(&self, url: &VideoUrl, stream: &RawStream, dest: &Path, progress: ProgressSender) -> Result<(), FetchError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct DownloadProgress {
    pub stream_id: Arc<str>,
    /// 0 to 100
    pub percent: f32,
}

/// Sending half of a progress channel.
///
/// Sending never fails: if nobody is listening anymore, events are dropped.
#[derive(Clone, Debug, Default)]
pub struct ProgressSender(Option<mpsc::UnboundedSender<DownloadProgress>>);

impl ProgressSender {
    pub fn disabled() -> ProgressSender {
        ProgressSender(None)
    }

    pub fn send(&self, event: DownloadProgress) {
        if let Some(ref tx) = self.0 {
            // a closed receiver just means nobody cares about progress anymore
            let _ = tx.unbounded_send(event);
        }
    }
}

pub fn progress_channel() -> (ProgressSender, mpsc::UnboundedReceiver<DownloadProgress>) {
    let (tx, rx) = mpsc::unbounded();
    (ProgressSender(Some(tx)), rx)
}

/// Logs every event until all senders are dropped
pub async fn log_progress(mut events: mpsc::UnboundedReceiver<DownloadProgress>) {
    while let Some(event) = events.next().await {
        info!("Download progress of stream {}: {:.2}%", event.stream_id, event.percent);
    }
}
