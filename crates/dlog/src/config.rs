//! Optional `dlog.conf` file holding the default SSH target.
//!
//! The file is INI formatted and lives next to the `dlog` executable:
//!
//! ```ini
//! [default]
//! target = user@host
//! # optional ssh connection settings
//! port = 2222
//! identity_file = /home/me/.ssh/id_swarm
//! ssh_options = -oBatchMode=yes -oConnectTimeout=10
//! ```
//!
//! A missing or malformed file never stops the program; it just means there
//! is no default target.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, one_of, space0},
    combinator::{all_consuming, map, rest},
    sequence::{delimited, preceded, separated_pair, terminated},
};
use crate::target::SshOptions;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// File name looked up next to the executable
pub const CONFIG_FILE_NAME: &str = "dlog.conf";

const DEFAULT_SECTION: &str = "default";
const TARGET_KEY: &str = "target";
const PORT_KEY: &str = "port";
const IDENTITY_FILE_KEY: &str = "identity_file";
const SSH_OPTIONS_KEY: &str = "ssh_options";

/// Why a config file could not be used
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// A line is not a section header, pair, comment or blank
    #[error("line {line}: cannot parse '{content}'")]
    Syntax {
        /// 1-based line number
        line: usize,
        /// The offending line
        content: String,
    },

    /// A key/value pair appeared before any `[section]`
    #[error("line {line}: key outside of any section")]
    MissingSectionHeader {
        /// 1-based line number
        line: usize,
    },

    /// A setting has a value of the wrong shape
    #[error("invalid {key} '{value}'")]
    InvalidValue {
        /// The setting
        key: &'static str,
        /// The rejected value
        value: String,
    },

    /// A section or key was defined twice
    #[error("line {line}: duplicate {what}")]
    Duplicate {
        /// 1-based line number
        line: usize,
        /// Description of the duplicate
        what: String,
    },
}

/// Parsed INI document: sections of lower-cased keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl IniDocument {
    /// Parse INI text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut doc = IniDocument::default();
        let mut current: Option<String> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let (_, parsed) = ini_line(trimmed).map_err(|_| ConfigError::Syntax {
                line: line_no,
                content: trimmed.to_string(),
            })?;

            match parsed {
                IniLine::Comment => {}
                IniLine::Section(name) => {
                    if doc.sections.contains_key(name) {
                        return Err(ConfigError::Duplicate {
                            line: line_no,
                            what: format!("section [{}]", name),
                        });
                    }
                    doc.sections.insert(name.to_string(), BTreeMap::new());
                    current = Some(name.to_string());
                }
                IniLine::Pair(key, value) => {
                    let section = current
                        .as_ref()
                        .and_then(|name| doc.sections.get_mut(name))
                        .ok_or(ConfigError::MissingSectionHeader { line: line_no })?;
                    let key = key.to_lowercase();
                    if section.contains_key(&key) {
                        return Err(ConfigError::Duplicate {
                            line: line_no,
                            what: format!("key '{}'", key),
                        });
                    }
                    section.insert(key, value.to_string());
                }
            }
        }

        Ok(doc)
    }

    /// Look up `key` in `section`
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|pairs| pairs.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    /// Section names in sorted order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum IniLine<'a> {
    Comment,
    Section(&'a str),
    Pair(&'a str, &'a str),
}

fn ini_line(input: &str) -> IResult<&str, IniLine<'_>> {
    all_consuming(alt((comment, section, pair))).parse(input)
}

fn comment(input: &str) -> IResult<&str, IniLine<'_>> {
    map(preceded(one_of("#;"), rest), |_| IniLine::Comment).parse(input)
}

fn section(input: &str) -> IResult<&str, IniLine<'_>> {
    map(
        terminated(
            delimited(char('['), take_while1(|c: char| c != ']'), char(']')),
            space0,
        ),
        |name: &str| IniLine::Section(name.trim()),
    )
    .parse(input)
}

fn pair(input: &str) -> IResult<&str, IniLine<'_>> {
    let (remaining, (key, value)) = separated_pair(
        take_while1(|c: char| c != '=' && c != ':' && c != '['),
        one_of("=:"),
        rest,
    )
    .parse(input)?;

    let key = key.trim();
    if key.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((remaining, IniLine::Pair(key, value.trim())))
}

/// Settings loaded once at startup and passed down explicitly
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    default_target: Option<String>,
    ssh: SshOptions,
}

impl Config {
    /// A config carrying the given default target
    pub fn with_default_target(target: impl Into<String>) -> Self {
        let target = target.into();
        Self {
            default_target: (!target.trim().is_empty()).then_some(target),
            ssh: SshOptions::default(),
        }
    }

    /// `dlog.conf` in the directory holding the running executable
    pub fn default_path() -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        let exe = exe.canonicalize().unwrap_or(exe);
        exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from [`Config::default_path`] when `None`.
    ///
    /// Never fails: a missing file is silent, an unreadable or malformed one
    /// is reported at warn level and treated as absent.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Self::default(),
        };

        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                debug!("Loaded config from {}: {:?}", path.display(), config);
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Strictly read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ini(&text)
    }

    /// Strictly parse config text
    pub fn from_ini(text: &str) -> Result<Self, ConfigError> {
        let doc = IniDocument::parse(text)?;
        let mut config = match doc.get(DEFAULT_SECTION, TARGET_KEY) {
            Some(target) => Self::with_default_target(target),
            None => Self::default(),
        };
        config.ssh = ssh_options(&doc)?;
        Ok(config)
    }

    /// The default SSH target, if one is configured
    pub fn default_target(&self) -> Option<&str> {
        self.default_target.as_deref()
    }

    /// Connection settings for remote targets
    pub fn ssh(&self) -> &SshOptions {
        &self.ssh
    }
}

fn ssh_options(doc: &IniDocument) -> Result<SshOptions, ConfigError> {
    let setting = |key: &str| doc.get(DEFAULT_SECTION, key).filter(|v| !v.is_empty());

    let port = setting(PORT_KEY)
        .map(|value| match value.parse::<u16>() {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(ConfigError::InvalidValue {
                key: PORT_KEY,
                value: value.to_string(),
            }),
        })
        .transpose()?;

    Ok(SshOptions {
        port,
        identity_file: setting(IDENTITY_FILE_KEY).map(PathBuf::from),
        extra: setting(SSH_OPTIONS_KEY)
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_default_target() {
        let config = Config::from_ini("[default]\ntarget = dev@box\n").unwrap();
        assert_eq!(config.default_target(), Some("dev@box"));
    }

    #[test]
    fn test_comments_colons_and_sections() {
        let text = "\
# dlog settings
; another comment style

[staging]
target: ops@staging

[default]
Target = deploy@prod
";
        let doc = IniDocument::parse(text).unwrap();
        assert_eq!(doc.get("staging", "target"), Some("ops@staging"));
        assert_eq!(doc.get("default", "TARGET"), Some("deploy@prod"));
        assert_eq!(doc.section_names().collect::<Vec<_>>(), vec!["default", "staging"]);

        let config = Config::from_ini(text).unwrap();
        assert_eq!(config.default_target(), Some("deploy@prod"));
    }

    #[test]
    fn test_value_may_contain_separators() {
        let doc = IniDocument::parse("[default]\ntarget = user@host:2222\n").unwrap();
        assert_eq!(doc.get("default", "target"), Some("user@host:2222"));
    }

    #[test]
    fn test_missing_section_or_key_means_no_target() {
        assert_eq!(Config::from_ini("").unwrap(), Config::default());
        assert_eq!(
            Config::from_ini("[other]\ntarget = a@b\n").unwrap(),
            Config::default()
        );
        assert_eq!(
            Config::from_ini("[default]\nuser = me\n").unwrap(),
            Config::default()
        );
        assert_eq!(Config::from_ini("[default]\ntarget =\n").unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_files_are_rejected() {
        assert!(matches!(
            IniDocument::parse("target = a@b\n"),
            Err(ConfigError::MissingSectionHeader { line: 1 })
        ));
        assert!(matches!(
            IniDocument::parse("[default]\nthis is not ini\n"),
            Err(ConfigError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            IniDocument::parse("[default\ntarget = x\n"),
            Err(ConfigError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            IniDocument::parse("[default]\ntarget = a\ntarget = b\n"),
            Err(ConfigError::Duplicate { line: 3, .. })
        ));
        assert!(matches!(
            IniDocument::parse("[default]\n[default]\n"),
            Err(ConfigError::Duplicate { line: 2, .. })
        ));
    }

    #[test]
    fn test_ssh_settings() {
        let config = Config::from_ini(
            "[default]\ntarget = ops@manager\nport = 2222\nidentity_file = /keys/swarm\nssh_options = -oBatchMode=yes  -oConnectTimeout=5\n",
        )
        .unwrap();

        assert_eq!(
            config.ssh(),
            &SshOptions {
                port: Some(2222),
                identity_file: Some(PathBuf::from("/keys/swarm")),
                extra: vec!["-oBatchMode=yes".into(), "-oConnectTimeout=5".into()],
            }
        );
        assert_eq!(
            Config::from_ini("[default]\ntarget = a@b\n").unwrap().ssh(),
            &SshOptions::default()
        );
    }

    #[test]
    fn test_bad_port_is_rejected() {
        for bad in ["ssh", "0", "70000"] {
            let text = format!("[default]\nport = {}\n", bad);
            assert!(matches!(
                Config::from_ini(&text),
                Err(ConfigError::InvalidValue { key: "port", .. })
            ));
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[default]\ntarget = dev@box").unwrap();

        let config = Config::load(Some(file.path()));
        assert_eq!(config.default_target(), Some("dev@box"));
    }

    #[test]
    fn test_load_missing_file_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join(CONFIG_FILE_NAME)));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_malformed_file_is_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "target = dev@box\n[[[").unwrap();

        let config = Config::load(Some(file.path()));
        assert_eq!(config.default_target(), None);
    }
}
