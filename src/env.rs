// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Resource directory configuration

use std::path::PathBuf;

/// Environment variable naming the user override directory
pub const USER_DIR_VAR: &str = "KAS_FONTSET_DIR";

/// Name of the user override directory under `$HOME`
pub const USER_DIR_NAME: &str = ".kas-fontset.d";

/// Name of the manifest file in each resource directory
pub const MANIFEST_NAME: &str = "mdb.dir";

/// The system resource directory, fixed at build time
pub const SYSTEM_DIR: &str = match option_env!("KAS_FONTSET_SYSTEM_DIR") {
    Some(dir) => dir,
    None => "/usr/share/kas-fontset",
};

/// Where the resource database looks for data
///
/// Directories are searched in order of precedence: user overrides, then
/// application data, then system defaults.
///
/// The default configuration reads the user directory from
/// [`USER_DIR_VAR`], falling back to [`USER_DIR_NAME`] under the home
/// directory, and uses [`SYSTEM_DIR`] as the system directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Built-in system data
    pub system_dir: Option<PathBuf>,
    /// Data supplied by the application
    pub app_dir: Option<PathBuf>,
    /// User overrides; also where locked resources are written
    pub user_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let user_dir = std::env::var_os(USER_DIR_VAR)
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(USER_DIR_NAME)));
        Config {
            system_dir: Some(PathBuf::from(SYSTEM_DIR)),
            app_dir: None,
            user_dir,
        }
    }
}

impl Config {
    /// A configuration with no directories at all
    ///
    /// Resources must then be registered explicitly.
    pub fn empty() -> Self {
        Config {
            system_dir: None,
            app_dir: None,
            user_dir: None,
        }
    }

    /// Set the application directory
    pub fn with_app_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.app_dir = Some(dir.into());
        self
    }

    /// Set the user override directory
    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = Some(dir.into());
        self
    }
}
