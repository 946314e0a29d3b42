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

use std::{path::{Path, PathBuf}, process::Stdio, sync::LazyLock, time::Duration};

use async_trait::async_trait;
use chrono::NaiveDate;
use cloneable_errors::{anyhow, bail, ErrContext, ErrorContext, ResContext};
use futures::{join, StreamExt};
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::{fs, io::{AsyncBufReadExt, AsyncReadExt, BufReader}, process::Command, time::timeout};
use tokio_stream::wrappers::LinesStream;

use crate::{DownloadProgress, FetchError, Manifest, ProgressSender, RawStream, VideoSource, VideoUrl};

// [download]  42.3% of   3.41MiB at  1.21MiB/s ETA 00:02
static PROGRESS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%").expect("Should be able to parse the progress regex"));

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct YtDlpConfig {
    /// yt-dlp executable, looked up in `PATH` if not absolute
    pub path: PathBuf,
    /// Upper bound on metadata extraction. Downloads are not limited.
    pub timeout_secs: u64,
    /// Passed to every invocation before any other argument
    pub extra_args: Vec<String>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("yt-dlp"),
            timeout_secs: 60,
            extra_args: Vec::new(),
        }
    }
}

/// [`VideoSource`] backed by the yt-dlp command line tool
pub struct YtDlpSource {
    config: YtDlpConfig,
}

impl YtDlpSource {
    pub fn new(config: YtDlpConfig) -> YtDlpSource {
        YtDlpSource { config }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.path);
        cmd.args(&self.config.extra_args)
           .stdin(Stdio::null())
           .stdout(Stdio::piped())
           .stderr(Stdio::piped())
           .kill_on_drop(true);
        cmd
    }

    /// Runs `yt-dlp --version`, used to check the executable is usable before serving requests
    pub async fn version(&self) -> Result<String, ErrorContext> {
        let mut cmd = self.command();
        cmd.arg("--version");
        let secs = self.config.timeout_secs;
        let output = timeout(Duration::from_secs(secs), cmd.output()).await
            .with_context(|| format!("yt-dlp did not finish within {secs} seconds"))?
            .with_context(|| format!("Failed to run {}", self.config.path.display()))?;
        if !output.status.success() {
            bail!("yt-dlp exited with {}: {}", output.status, last_line(&output.stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    async fn dump_json(&self, url: &VideoUrl) -> Result<Manifest, ErrorContext> {
        let mut cmd = self.command();
        cmd.args(["--dump-single-json", "--no-playlist", "--no-warnings", "--"])
           .arg(url.as_str());
        let secs = self.config.timeout_secs;
        let output = timeout(Duration::from_secs(secs), cmd.output()).await
            .with_context(|| format!("yt-dlp did not finish within {secs} seconds"))?
            .context("Failed to run yt-dlp")?;
        if !output.status.success() {
            bail!("yt-dlp exited with {}: {}", output.status, last_line(&output.stderr));
        }
        parse_manifest(&output.stdout)
    }

    async fn fetch_stream(&self, url: &VideoUrl, stream: &RawStream, dest: &Path, progress: ProgressSender) -> Result<(), ErrorContext> {
        let mut cmd = self.command();
        cmd.arg("--format").arg(&*stream.id)
           .arg("--output").arg(dest)
           .args(["--newline", "--no-part", "--no-mtime", "--no-playlist", "--force-overwrites", "--"])
           .arg(url.as_str());
        let mut child = cmd.spawn().context("Failed to start yt-dlp")?;
        let stdout = child.stdout.take().context("Failed to capture yt-dlp stdout")?;
        let mut stderr = child.stderr.take().context("Failed to capture yt-dlp stderr")?;

        let report = async {
            let mut lines = LinesStream::new(BufReader::new(stdout).lines());
            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) => {
                        if let Some(percent) = parse_progress(&line) {
                            progress.send(DownloadProgress { stream_id: stream.id.clone(), percent });
                        } else {
                            debug!("yt-dlp: {line}");
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read yt-dlp output: {e}");
                        break;
                    },
                }
            }
        };
        let collect_stderr = async {
            let mut buf = Vec::new();
            if let Err(e) = stderr.read_to_end(&mut buf).await {
                warn!("Failed to read yt-dlp error output: {e}");
            }
            buf
        };
        let ((), stderr) = join!(report, collect_stderr);

        let status = child.wait().await.context("Failed to wait for yt-dlp")?;
        if !status.success() {
            bail!("yt-dlp exited with {status}: {}", last_line(&stderr));
        }
        let written = fs::metadata(dest).await.context("yt-dlp finished without writing the output file")?;
        if written.len() == 0 {
            bail!("yt-dlp wrote an empty file");
        }
        Ok(())
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_manifest(&self, url: &VideoUrl) -> Result<Manifest, FetchError> {
        self.dump_json(url).await
            .map_err(|e| FetchError::Extraction(e.context(format!("Failed to list the streams of {url}"))))
    }

    async fn download(&self, url: &VideoUrl, stream: &RawStream, dest: &Path, progress: ProgressSender) -> Result<(), FetchError> {
        self.fetch_stream(url, stream, dest, progress).await
            .map_err(|e| FetchError::Extraction(e.context(format!("Failed to download stream {} of {url}", stream.id))))
    }
}

fn last_line(output: &[u8]) -> String {
    let text = String::from_utf8_lossy(output);
    text.lines().rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no error output")
        .to_owned()
}

pub fn parse_progress(line: &str) -> Option<f32> {
    let captures = PROGRESS_REGEX.captures(line)?;
    captures[1].parse::<f32>().ok().map(|p| p.clamp(0., 100.))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_manifest(json: &[u8]) -> Result<Manifest, ErrorContext> {
    let video: out::Video = serde_json::from_slice(json).context("Failed to deserialize yt-dlp output")?;
    if video.id.is_empty() {
        return Err(anyhow!("yt-dlp output did not contain a video id"));
    }
    let streams = video.formats.into_iter()
        .filter_map(out::Format::into_raw_stream)
        .collect();
    Ok(Manifest {
        video_id: video.id.into(),
        title: video.title.into(),
        author: video.uploader.or(video.channel).unwrap_or_default().into(),
        length_secs: video.duration.map_or(0, |d| d.max(0.).round() as u64),
        thumbnail_url: video.thumbnail.map(Into::into),
        description: video.description.map(Into::into),
        view_count: video.view_count,
        publish_date: video.upload_date.and_then(|d| NaiveDate::parse_from_str(&d, "%Y%m%d").ok()),
        streams,
    })
}

mod out {
    use serde::Deserialize;

    use crate::RawStream;

    #[derive(Deserialize, Default)]
    #[serde(default)]
    pub struct Video {
        pub id: String,
        pub title: String,
        pub uploader: Option<String>,
        pub channel: Option<String>,
        pub duration: Option<f64>,
        pub thumbnail: Option<String>,
        pub description: Option<String>,
        pub view_count: Option<u64>,
        pub upload_date: Option<String>,
        pub formats: Vec<Format>,
    }

    #[derive(Deserialize, Default)]
    #[serde(default)]
    pub struct Format {
        pub format_id: String,
        pub ext: String,
        pub vcodec: Option<String>,
        pub acodec: Option<String>,
        pub abr: Option<f64>,
        pub height: Option<u32>,
        pub fps: Option<f64>,
        pub filesize: Option<u64>,
        pub filesize_approx: Option<u64>,
    }

    fn is_codec(codec: Option<&str>) -> bool {
        codec.is_some_and(|c| c != "none")
    }

    impl Format {
        /// Storyboards and other formats without audio or video are dropped
        pub fn into_raw_stream(self) -> Option<RawStream> {
            let has_video = is_codec(self.vcodec.as_deref());
            let has_audio = is_codec(self.acodec.as_deref());
            if self.format_id.is_empty() || !(has_audio || has_video) {
                return None;
            }
            let mime_type = format!("{}/{}", if has_video { "video" } else { "audio" }, self.ext);
            Some(RawStream {
                id: self.format_id.into(),
                container: self.ext.into(),
                mime_type: mime_type.into(),
                audio_bitrate: self.abr.filter(|b| *b > 0.),
                height: if has_video { self.height } else { None },
                fps: self.fps,
                filesize: self.filesize.or(self.filesize_approx),
                has_audio,
                has_video,
            })
        }
    }
}
