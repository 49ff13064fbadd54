// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::PathBuf;

use clap::Parser;

use crate::catalog::load_catalog;
use crate::concierge::recommender::Credential;
use crate::concierge::recommender::build_recommender;
use crate::concierge::session::ConciergeSession;
use crate::config::Config;
use crate::error::Fallible;
use crate::error::fail;
use crate::types::chat::Role;
use crate::web::server::ServerOptions;
use crate::web::server::start_server;

const DEFAULT_PORT: u16 = 8000;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve the discovery screen in the browser.
    Serve {
        /// Path to a TOML restaurant catalog. Defaults to the built-in one.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// The port to listen on.
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Don't open the browser.
        #[arg(long)]
        no_open: bool,
    },
    /// Validate a catalog and config without serving.
    Check {
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Ask the concierge a single question.
    Ask {
        /// What you're craving.
        query: String,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve {
            catalog,
            config,
            port,
            no_open,
        } => {
            let config = Config::load(config.as_deref())?;
            let catalog = load_catalog(catalog.as_deref())?;
            println!("Serving {} restaurants on port {port}.", catalog.len());
            let options = ServerOptions {
                port,
                open_browser: !no_open,
            };
            start_server(catalog, config, credential_from_env(), options).await
        }
        Command::Check { catalog, config } => {
            Config::load(config.as_deref())?;
            let catalog = load_catalog(catalog.as_deref())?;
            println!("Found {} restaurants.", catalog.len());
            println!("ok");
            Ok(())
        }
        Command::Ask { query, config } => {
            let config = Config::load(config.as_deref())?;
            let recommender = build_recommender(credential_from_env(), &config.concierge);
            let session = ConciergeSession::new(recommender, &config.concierge);
            if !session.send(&query).await {
                return fail("query is empty.");
            }
            let messages = session.messages();
            match messages.last() {
                Some(message) if message.role == Role::Assistant => {
                    println!("{}", message.text);
                    Ok(())
                }
                _ => fail("no reply from the concierge."),
            }
        }
    }
}

/// The one place the environment is read.
fn credential_from_env() -> Credential {
    pick_credential(
        std::env::var("GEMINI_API_KEY").ok(),
        std::env::var("API_KEY").ok(),
    )
}

fn pick_credential(gemini: Option<String>, fallback: Option<String>) -> Credential {
    match Credential::from_optional(gemini) {
        Credential::Absent => Credential::from_optional(fallback),
        present => present,
    }
}
