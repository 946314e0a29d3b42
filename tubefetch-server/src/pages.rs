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
use std::{fs, path::Path};

use log::{info, warn};

const PLACEHOLDER: &str = "{{ error_message }}";
const FALLBACK_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>TubeFetch - Error</title>
</head>
<body>
    <h1>{{ error_message }}</h1>
    <p><a href="/">Back to TubeFetch</a></p>
</body>
</html>
"#;

/// HTML page shown for non-API 404 and 500 responses
pub struct ErrorPage {
    template: String,
}

impl ErrorPage {
    /// Reads the template once, using a built-in page if it can't be read
    pub fn load(path: &Path) -> ErrorPage {
        match fs::read_to_string(path) {
            Ok(template) if template.contains(PLACEHOLDER) => {
                info!("Loaded error page template from {}", path.display());
                ErrorPage { template }
            },
            Ok(_) => {
                warn!("{} does not contain {PLACEHOLDER}, using the built-in error page", path.display());
                ErrorPage::fallback()
            },
            Err(err) => {
                warn!("Failed to read {}, using the built-in error page: {err}", path.display());
                ErrorPage::fallback()
            },
        }
    }

    pub fn fallback() -> ErrorPage {
        ErrorPage { template: FALLBACK_TEMPLATE.to_owned() }
    }

    /// Inserts `message` verbatim, callers only pass fixed strings
    pub fn render(&self, message: &'static str) -> String {
        self.template.replace(PLACEHOLDER, message)
    }
}
