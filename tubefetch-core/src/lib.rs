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

mod errors;
mod types;
pub mod url;
pub mod filename;
pub mod shaping;
pub mod source;
pub mod ytdlp;
pub mod download;

pub use errors::*;
pub use types::*;
pub use url::VideoUrl;
pub use source::{VideoSource, DownloadProgress, ProgressSender, progress_channel, log_progress};
pub use ytdlp::{YtDlpSource, YtDlpConfig};
pub use download::{Downloader, DownloadResult};
