//! Headless front end for the Trellis workbench.
//!
//! The `trellis` binary loads [`AppConfig`](app_config::AppConfig), sets up
//! logging, builds a [`UiService`](trellis_ui_common::UiService) over the
//! configured data root and dispatches one subcommand.

pub mod app_config;
pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;

pub use app_config::{AppConfig, ConfigManager};
pub use cli::{Cli, Commands, ConfigCommands};
