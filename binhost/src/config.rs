//! Runtime configuration.
//!
//! Everything the publisher needs to know about where to publish is gathered
//! once at startup into a [`BinhostConfig`] and passed by reference from there.
//! Values come from two places:
//!
//! - the process environment (credentials, target repository, `CHOST`), and
//! - an optional INI settings file for endpoint and naming overrides.
//!
//! # Settings file
//!
//! ```ini
//! [github]
//! api_url = https://api.github.com
//! upload_url = https://uploads.github.com
//! download_url = https://github.com
//! branch_prefix = binhost-
//! base_branch = master
//! timeout_secs = 280
//! committer_email = binhost@builder.example.org
//!
//! [index]
//! file = Packages
//!
//! [portage]
//! repository = /var/db/repos/gentoo
//! ```
//!
//! The file is read from `$BINHOST_CONFIG`, or from
//! [`DEFAULT_SETTINGS_PATH`] when that exists.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::forge::Committer;

/// Environment variable holding the GitHub token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Environment variable holding the `owner/name` of the binhost repository.
pub const REPOSITORY_VAR: &str = "GITHUB_BH_REPO";

/// Environment variable holding the build host triple.
pub const CHOST_VAR: &str = "CHOST";

/// Environment variable pointing at the settings file.
pub const SETTINGS_VAR: &str = "BINHOST_CONFIG";

/// Settings file used when `$BINHOST_CONFIG` is not set.
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/portage/binhost.conf";

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default GitHub asset upload endpoint.
pub const DEFAULT_UPLOAD_URL: &str = "https://uploads.github.com";

/// Default base for public release download links.
pub const DEFAULT_DOWNLOAD_URL: &str = "https://github.com";

/// Default prefix of the publishing branch; the `CHOST` is appended.
pub const DEFAULT_BRANCH_PREFIX: &str = "binhost-";

/// Branch new publishing branches are forked from.
pub const DEFAULT_BASE_BRANCH: &str = "master";

/// Name of the package index file, both in `PKGDIR` and in the branch.
pub const DEFAULT_INDEX_FILE: &str = "Packages";

/// Timeout applied to every remote call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 280;

/// Display name of the synthetic committer.
pub const COMMITTER_NAME: &str = "binhost";

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    /// The settings file could not be read or parsed.
    #[error("failed to load settings from {path}: {source}")]
    SettingsLoad {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// A settings value has the wrong shape.
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// GitHub connection and naming settings.
#[derive(Clone)]
pub struct GitHubConfig {
    /// Access token used as bearer credential.
    pub token: String,

    /// Target repository as `owner/name`.
    pub repository: String,

    /// REST API base URL.
    pub api_url: String,

    /// Asset upload base URL.
    pub upload_url: String,

    /// Base URL of public release downloads.
    pub download_url: String,

    /// Prefix of the publishing branch.
    pub branch_prefix: String,

    /// Branch the publishing branch is created from.
    pub base_branch: String,

    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl GitHubConfig {
    /// Create settings for a repository with default endpoints.
    pub fn new(token: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            repository: repository.into(),
            api_url: DEFAULT_API_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Publishing branch for a host triple, e.g. `binhost-x86_64-pc-linux-gnu`.
    pub fn branch_name(&self, chost: &str) -> String {
        format!("{}{}", self.branch_prefix, chost)
    }

    /// Download base written to the index header as `URI`.
    ///
    /// Release tags are `<branch>/<category>[/<name>]` and asset names are the
    /// archive file names, so `URI + "/" + PATH` resolves to the asset.
    pub fn header_uri(&self, branch: &str) -> String {
        format!(
            "{}/{}/releases/download/{}",
            self.download_url.trim_end_matches('/'),
            self.repository,
            branch
        )
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"<redacted>")
            .field("repository", &self.repository)
            .field("api_url", &self.api_url)
            .field("upload_url", &self.upload_url)
            .field("download_url", &self.download_url)
            .field("branch_prefix", &self.branch_prefix)
            .field("base_branch", &self.base_branch)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct BinhostConfig {
    /// GitHub settings.
    pub github: GitHubConfig,

    /// Build host triple; namespaces the publishing branch.
    pub chost: String,

    /// File name of the package index.
    pub index_file: String,

    /// Ebuild repository holding `metadata/md5-cache`, if overridden.
    pub portage_repository: Option<PathBuf>,

    /// Identity recorded on index commits.
    pub committer: Committer,
}

impl BinhostConfig {
    /// Create a configuration with defaults for everything but the essentials.
    pub fn new(github: GitHubConfig, chost: impl Into<String>) -> Self {
        Self {
            github,
            chost: chost.into(),
            index_file: DEFAULT_INDEX_FILE.to_string(),
            portage_repository: None,
            committer: Committer::new(
                COMMITTER_NAME,
                format!("{}@{}", COMMITTER_NAME, local_hostname()),
            ),
        }
    }

    /// Load the configuration from the process environment.
    ///
    /// Returns `Ok(None)` when the token or the repository is missing, which
    /// means publishing is not configured on this host and should be skipped.
    pub fn from_env() -> ConfigResult<Option<Self>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = optional(&lookup, TOKEN_VAR);
        let repository = optional(&lookup, REPOSITORY_VAR);
        let (Some(token), Some(repository)) = (token, repository) else {
            return Ok(None);
        };

        let settings = match optional(&lookup, SETTINGS_VAR) {
            Some(path) => Settings::load(Path::new(&path))?,
            None if Path::new(DEFAULT_SETTINGS_PATH).is_file() => {
                Settings::load(Path::new(DEFAULT_SETTINGS_PATH))?
            }
            None => Settings::default(),
        };

        let chost = require(&lookup, CHOST_VAR)?;
        let config = Self::new(GitHubConfig::new(token, repository), chost);

        Ok(Some(settings.apply(config)))
    }

    /// Override the settings file values programmatically.
    pub fn with_settings(self, settings: Settings) -> Self {
        settings.apply(self)
    }

    /// Set the ebuild repository used for package descriptions.
    pub fn with_portage_repository(mut self, path: impl Into<PathBuf>) -> Self {
        self.portage_repository = Some(path.into());
        self
    }

    /// Set the committer identity.
    pub fn with_committer(mut self, committer: Committer) -> Self {
        self.committer = committer;
        self
    }

    /// Publishing branch for the configured host triple.
    pub fn branch_name(&self) -> String {
        self.github.branch_name(&self.chost)
    }
}

/// Optional overrides read from the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub api_url: Option<String>,
    pub upload_url: Option<String>,
    pub download_url: Option<String>,
    pub branch_prefix: Option<String>,
    pub base_branch: Option<String>,
    pub timeout_secs: Option<u64>,
    pub committer_email: Option<String>,
    pub index_file: Option<String>,
    pub portage_repository: Option<PathBuf>,
}

impl Settings {
    /// Read settings from an INI file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::SettingsLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Read settings from INI text.
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::SettingsLoad {
            path: PathBuf::from("<inline>"),
            source: ini::Error::Parse(e),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> ConfigResult<Self> {
        let get = |section: &str, key: &str| -> Option<String> {
            ini.section(Some(section))
                .and_then(|s| s.get(key))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let timeout_secs = match get("github", "timeout_secs") {
            Some(value) => Some(value.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "github.timeout_secs".to_string(),
                value,
            })?),
            None => None,
        };

        Ok(Self {
            api_url: get("github", "api_url"),
            upload_url: get("github", "upload_url"),
            download_url: get("github", "download_url"),
            branch_prefix: get("github", "branch_prefix"),
            base_branch: get("github", "base_branch"),
            timeout_secs,
            committer_email: get("github", "committer_email"),
            index_file: get("index", "file"),
            portage_repository: get("portage", "repository").map(PathBuf::from),
        })
    }

    fn apply(self, mut config: BinhostConfig) -> BinhostConfig {
        let github = &mut config.github;
        if let Some(v) = self.api_url {
            github.api_url = v;
        }
        if let Some(v) = self.upload_url {
            github.upload_url = v;
        }
        if let Some(v) = self.download_url {
            github.download_url = v;
        }
        if let Some(v) = self.branch_prefix {
            github.branch_prefix = v;
        }
        if let Some(v) = self.base_branch {
            github.base_branch = v;
        }
        if let Some(secs) = self.timeout_secs {
            github.timeout = Duration::from_secs(secs);
        }
        if let Some(email) = self.committer_email {
            config.committer.email = email;
        }
        if let Some(v) = self.index_file {
            config.index_file = v;
        }
        if self.portage_repository.is_some() {
            config.portage_repository = self.portage_repository;
        }
        config
    }
}

/// Read a variable, treating empty values as unset.
pub(crate) fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Read a variable that must be present.
pub(crate) fn require<F>(lookup: &F, key: &'static str) -> ConfigResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or(ConfigError::MissingVar(key))
}

/// Host name of this machine, used in the committer e-mail.
fn local_hostname() -> String {
    let mut buf = [0u8; 256];

    // SAFETY: `buf` is valid for writes of `buf.len()` bytes for the whole call.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return "localhost".to_string();
    }

    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    match String::from_utf8_lossy(&buf[..end]).trim() {
        "" => "localhost".to_string(),
        name => name.to_string(),
    }
}
