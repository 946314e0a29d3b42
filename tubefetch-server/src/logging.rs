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

use std::{fs::OpenOptions, io::{self, Write}, path::Path};

use cloneable_errors::{ErrorContext, ResContext};
use env_logger::{Builder, Env, Target};

/// Writes everything to both inner writers
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Tee { first, second }
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

fn file_target(path: &Path) -> Result<Box<dyn Write + Send>, ErrorContext> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open the log file {}", path.display()))?;
    Ok(Box::new(Tee::new(io::stderr(), file)))
}

/// Logs to stderr, and to `log_file` as well if one is given.
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
pub fn init(log_file: Option<&Path>) -> Result<(), ErrorContext> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        builder.target(Target::Pipe(file_target(path)?));
    }
    builder.try_init().context("Failed to set up logging")?;
    Ok(())
}
