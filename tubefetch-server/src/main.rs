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
use std::{fs::{self, Permissions, set_permissions}, os::unix::prelude::PermissionsExt, path::Path, sync::Arc};
use actix_web::{HttpServer, App, web, middleware::NormalizePath};
use cloneable_errors::{ErrorContext, ResContext};
use log::{info, warn};
use tubefetch_core::{Downloader, YtDlpSource};

mod errors;
mod logging;
mod middleware;
mod pages;
mod routes;
mod state;
use state::*;

const CONFIG_PATH: &str = "config.toml";


#[actix_web::main]
async fn main() -> Result<(), ErrorContext> {
    let (config, origin) = AppConfig::load(Path::new(CONFIG_PATH))?;
    logging::init(config.log_file())?;
    info!("TubeFetch v{}", env!("CARGO_PKG_VERSION"));
    if origin == ConfigOrigin::CreatedDefault {
        info!("Wrote the default configuration to {CONFIG_PATH}");
    }
    if let Some(log_file) = config.log_file() {
        info!("Logging to {}", log_file.display());
    }
    let config = web::Data::new(config);

    fs::create_dir_all(&config.download_path).with_context(|| format!("Failed to create the download directory {}", config.download_path.display()))?;
    info!("Saving downloads to {}", config.download_path.display());

    let ytdlp = YtDlpSource::new(config.ytdlp.clone());
    match ytdlp.version().await {
        Ok(version) => info!("Using yt-dlp {version}"),
        // not fatal
        Err(err) => warn!("yt-dlp is not usable yet, requests will fail until it is: {err:?}"),
    }
    let downloader = web::Data::new(Downloader::new(Arc::new(ytdlp), config.download_path.clone()));
    let error_page = web::Data::new(pages::ErrorPage::load(&config.static_content_path.join("error.html")));

    let mut server = {
        let config = config.clone();
        HttpServer::new(move || {
            App::new()
                .wrap(middleware::ErrorPages)
                .wrap(NormalizePath::trim())
                .configure(routes::configure(config.clone(), downloader.clone(), error_page.clone()))
        })
    };
    if let Some((ref ip, port)) = config.listen.tcp {
        let ip_str = ip.as_str();
        server = server.bind((ip_str, port)).with_context(|| format!("Failed to bind to tcp port {ip_str}:{port}"))?;
        info!("Listening on {ip_str}:{port}");
    };
    if let Some(ref path) = config.listen.unix {
        let path_str = path.as_str();
        server = server.bind_uds(path_str).with_context(|| format!("Failed to bind to unix socket {path_str}"))?;
        if let Some(mode) = config.listen.unix_mode {
            let perms = Permissions::from_mode(mode);
            set_permissions(path_str, perms).with_context(|| format!("Failed to change mode of unix socket {path_str} to {mode}"))?;
        }
        info!("Listening on {path_str}");
    };
    server.run()
    .await
    .context("Error while running the server")
}
