//! Central module for client configuration settings.
//!
//! This module handles loading the API base URL and the location of the
//! persisted session file from environment variables, with defaults that
//! match the hosted FretesJá backend.

use anyhow::{Context, Result};
use expanduser::expanduser;
use std::env;
use std::path::PathBuf;

/// API root the hosted frontend talks to.
pub const DEFAULT_API_BASE_URL: &str = "https://api-fretesja.onrender.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub session_file: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let session_file =
            env::var("SESSION_FILE").unwrap_or_else(|_| "~/.fretesja/session.json".to_string());
        let session_file = expanduser(&session_file)
            .with_context(|| format!("SESSION_FILE is not a usable path: {session_file}"))?;

        Ok(Config {
            api_base_url,
            session_file,
        })
    }
}
