use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use numbook_core::domain::phone::{
    validate_country_code, validate_digit_bounds, DEFAULT_COUNTRY_CODE, DEFAULT_MAX_DIGITS,
    DEFAULT_MIN_DIGITS,
};
use numbook_core::{PhoneRules, UserId};
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "numbook";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of per-user session trees; `None` means the platform data dir.
    pub sessions_dir: Option<PathBuf>,
    pub admin_ids: Vec<UserId>,
    pub phone: PhoneConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneConfig {
    pub default_country_code: String,
    pub min_digits: usize,
    pub max_digits: usize,
}

impl PhoneConfig {
    /// Fields are public, so values are checked again here rather than trusted.
    pub fn rules(&self) -> Result<PhoneRules> {
        let code = validate_country_code(&self.default_country_code)
            .map_err(|_| ConfigError::InvalidCountryCode(self.default_country_code.clone()))?;
        let (min, max) = (self.min_digits, self.max_digits);
        PhoneRules::new(&code, min, max).map_err(|_| ConfigError::InvalidDigitBounds { min, max })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sessions_dir: None,
            admin_ids: Vec::new(),
            phone: PhoneConfig {
                default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
                min_digits: DEFAULT_MIN_DIGITS,
                max_digits: DEFAULT_MAX_DIGITS,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid sessions_dir value: {0}")]
    InvalidSessionsDir(PathBuf),
    #[error("invalid phone.default_country_code value: {0}")]
    InvalidCountryCode(String),
    #[error("invalid phone digit bounds: min {min}, max {max}")]
    InvalidDigitBounds { min: usize, max: usize },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    sessions_dir: Option<PathBuf>,
    admin_ids: Option<Vec<i64>>,
    phone: Option<PhoneFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PhoneFile {
    default_country_code: Option<String>,
    min_digits: Option<usize>,
    max_digits: Option<usize>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path.clone()) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(dir) = parsed.sessions_dir {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidSessionsDir(dir));
        }
        config.sessions_dir = Some(dir);
    }

    if let Some(ids) = parsed.admin_ids {
        let mut admins: Vec<UserId> = ids.into_iter().map(UserId).collect();
        admins.sort();
        admins.dedup();
        config.admin_ids = admins;
    }

    if let Some(phone) = parsed.phone {
        if let Some(code) = phone.default_country_code {
            config.phone.default_country_code = validate_country_code(&code)
                .map_err(|_| ConfigError::InvalidCountryCode(code.clone()))?;
        }
        if let Some(min) = phone.min_digits {
            config.phone.min_digits = min;
        }
        if let Some(max) = phone.max_digits {
            config.phone.max_digits = max;
        }
        let (min, max) = (config.phone.min_digits, config.phone.max_digits);
        validate_digit_bounds(min, max)
            .map_err(|_| ConfigError::InvalidDigitBounds { min, max })?;
    }

    Ok(config)
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
