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
use std::{fs::File, io::{self, Read, Write}, path::{Path, PathBuf}};

use cloneable_errors::{bail, ErrContext, ErrorContext, ResContext};
use serde::{Deserialize, Serialize};
use tubefetch_core::YtDlpConfig;

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
    pub download_path: PathBuf,
    pub static_content_path: PathBuf,
    pub listen: ListenConfig,
    /// Upper bound on request bodies, in bytes
    pub max_content_length: usize,
    pub ytdlp: YtDlpConfig,
    /// Log output is copied here in addition to stderr, an empty path disables it
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_path: PathBuf::from("./downloads"),
            static_content_path: PathBuf::from("./static"),
            listen: ListenConfig::default(),
            max_content_length: 64 * 1024 * 1024,
            ytdlp: YtDlpConfig::default(),
            log_file: PathBuf::from("./tubefetch.log"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigOrigin {
    Loaded,
    /// No config existed, the defaults were written out
    CreatedDefault,
}

impl AppConfig {
    /// Reads the config at `path`, or writes the defaults there if the file doesn't exist yet
    pub fn load(path: &Path) -> Result<(AppConfig, ConfigOrigin), ErrorContext> {
        let path_str = path.display();
        match File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                file.read_to_string(&mut contents).with_context(|| format!("Failed to read {path_str}"))?;
                let cfg: AppConfig = toml::from_str(&contents).with_context(|| format!("Failed to deserialize contents of {path_str}"))?;
                cfg.validate()?;
                Ok((cfg, ConfigOrigin::Loaded))
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let cfg = AppConfig::default();
                let serialized = toml::to_string(&cfg).context("Failed to serialize default AppConfig as TOML")?;
                let mut file = File::options().write(true).create_new(true).open(path).with_context(|| format!("Failed to create {path_str}"))?;
                write!(file, "{serialized}").with_context(|| format!("Failed to write serialized default AppConfig to {path_str}"))?;
                Ok((cfg, ConfigOrigin::CreatedDefault))
            },
            Err(e) => Err(e.context(format!("Failed to open {path_str}"))),
        }
    }

    pub fn log_file(&self) -> Option<&Path> {
        if self.log_file.as_os_str().is_empty() {
            None
        } else {
            Some(&self.log_file)
        }
    }

    fn validate(&self) -> Result<(), ErrorContext> {
        if self.listen.tcp.is_none() && self.listen.unix.is_none() {
            bail!("Invalid configuration - no tcp port or unix socket path specified");
        }
        if self.max_content_length == 0 {
            bail!("Invalid configuration - max_content_length must be positive");
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ListenConfig {
    pub tcp: Option<(String, u16)>,
    pub unix: Option<String>,
    pub unix_mode: Option<u32>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            tcp: Some(("127.0.0.1".to_owned(), 5000)),
            unix: None,
            unix_mode: None,
        }
    }
}
