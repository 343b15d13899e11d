//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled                                        |
//! |------------|---------------------------------------------------------|
//! | `auth`     | `Login`, `Register`, `Logout`, `Whoami`                 |
//! | `pipeline` | `Upload`, `Parse`, `Status`, `Reset`, `Compare`, `Analyze` |
//! | `ats`      | `Templates`, `Generate`, `Download`                     |
//! | `config`   | `Config`                                                |

pub mod ats;
pub mod auth;
pub mod config;
pub mod pipeline;

pub use ats::{cmd_download, cmd_generate, cmd_templates};
pub use auth::{cmd_login, cmd_logout, cmd_register, cmd_whoami};
pub use config::cmd_config;
pub use pipeline::{cmd_analyze, cmd_compare, cmd_parse, cmd_reset, cmd_status, cmd_upload};

use anyhow::Result;
use cvtailor::client::{self, Client};
use cvtailor::config::Config;

/// Connect with the pipeline resumed from the on-disk snapshot.
pub(crate) fn pipeline_client(config: &Config) -> Result<Client> {
    let state = client::load_pipeline_state(&config.pipeline_cache_path());
    Client::with_pipeline_state(config, state)
}

/// Persist the pipeline for the next invocation. Called after every
/// pipeline operation, success or failure, so error states survive too.
pub(crate) fn save_pipeline(config: &Config, client: &Client) -> Result<()> {
    client::save_pipeline_state(&config.pipeline_cache_path(), &client.pipeline.state())
}
