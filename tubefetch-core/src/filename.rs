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

use chrono::NaiveDateTime;

use crate::StreamKind;

pub const MAX_FILENAME_LEN: usize = 255;
const MAX_BASE_LEN: usize = 100;
const MAX_EXTENSION_LEN: usize = 5;
const UNSAFE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turns a human readable title into a file name that is safe to create in the download directory.
///
/// The timestamp is appended to the base name so that repeated downloads of the same video don't
/// overwrite each other, unless they happen within the same second.
pub fn sanitize_filename(name: &str, kind: StreamKind, timestamp: NaiveDateTime) -> String {
    let stripped: String = name.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect();
    let secured = secure_filename(&stripped);
    let collapsed = secured.split_whitespace().collect::<Vec<_>>().join("_");

    let (base, ext) = split_extension(&collapsed);
    let ext = ext.unwrap_or(kind.default_extension());
    let base: String = if base.is_empty() { "download" } else { base }
        .chars().take(MAX_BASE_LEN).collect();

    let mut result = format!("{base}_{}{ext}", timestamp.format("%Y%m%d_%H%M%S"));
    if let Some((cutoff, _)) = result.char_indices().nth(MAX_FILENAME_LEN) {
        result.truncate(cutoff);
    }
    result
}

/// ASCII-only filter in the spirit of werkzeug's `secure_filename`
fn secure_filename(name: &str) -> String {
    let ascii: String = name.chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_owned()
}

/// Splits `name.ext` into `("name", Some(".ext"))` if the suffix looks like a real extension
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &name[idx + 1..];
            if (1..=MAX_EXTENSION_LEN).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                (&name[..idx], Some(&name[idx..]))
            } else {
                (name, None)
            }
        },
        _ => (name, None),
    }
}
