/*
 * main.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Segnalibro, a small URL-to-content fetcher.
 *
 * Segnalibro is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Segnalibro is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Segnalibro.  If not, see <http://www.gnu.org/licenses/>.
 */

//! The segnalibro CLI: fetch one URL and print what it resolves to.
//!
//! Usage: `segnalibro [--http-version 1.0|1.1] [--no-keep-alive] [--width N] [--config PATH] <URL>`
//!
//! Settings come from `~/.segnalibro/config.xml` (or `--config`), then flags override them.
//! Logging goes through env_logger; set `RUST_LOG=debug` to see connection and cache activity.

mod renderer;

use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use segnalibro_core::config::{default_config_path, FetchConfig};
use segnalibro_core::protocol::http::HttpVersion;
use segnalibro_core::ContentFetcher;

use crate::renderer::{Renderer, TextRenderer};

#[derive(Parser)]
#[command(name = "segnalibro", version, about = "Fetch a URL and print its content")]
struct Cli {
    /// URL to fetch (http, https, file, data, about, view-source)
    url: String,

    /// HTTP version to speak: 1.0 or 1.1
    #[arg(long = "http-version", value_parser = parse_http_version)]
    http_version: Option<HttpVersion>,

    /// Send `Connection: close` instead of asking to keep the connection open
    #[arg(long = "no-keep-alive")]
    no_keep_alive: bool,

    /// Viewport width used to wrap text
    #[arg(long, default_value_t = 80)]
    width: usize,

    /// Configuration file (default ~/.segnalibro/config.xml)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_http_version(s: &str) -> Result<HttpVersion, String> {
    HttpVersion::from_label(s).ok_or_else(|| format!("unsupported HTTP version {:?}", s))
}

fn load_config(cli: &Cli) -> Result<FetchConfig, String> {
    let mut config = match cli.config.clone().or_else(default_config_path) {
        Some(path) => FetchConfig::load(&path).map_err(|e| format!("{}: {}", path.display(), e))?,
        None => FetchConfig::default(),
    };
    if let Some(version) = cli.http_version {
        config.http_version = version;
    }
    if cli.no_keep_alive {
        config.keep_alive = false;
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(&cli)?;
    log::debug!("fetching {} over {}", cli.url, config.http_version);
    let fetcher = ContentFetcher::from_config(config);
    let content = fetcher.fetch_str(&cli.url).await.map_err(|e| e.to_string())?;
    let stdout = io::stdout();
    let mut renderer = TextRenderer::new(stdout.lock());
    renderer
        .render(&content, cli.width)
        .map_err(|e| format!("write output: {}", e))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(run(cli)) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
