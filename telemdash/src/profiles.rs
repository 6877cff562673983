//! Device profiles: load/save a JSON mapping of profile name -> { host, port, poll_interval }.
//! Stored under XDG config dir: $XDG_CONFIG_HOME/telemdash/profiles.json (fallback ~/.config/telemdash/profiles.json)

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, io, path::PathBuf};

use crate::config::{DeviceConfig, PollInterval};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, DeviceConfig>,
    #[serde(default)]
    pub version: u32,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("telemdash")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("telemdash")
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

pub fn load_profiles() -> ProfilesFile {
    match fs::read_to_string(profiles_path()) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => ProfilesFile::default(),
    }
}

pub fn save_profiles(p: &ProfilesFile) -> io::Result<()> {
    let path = profiles_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(p).map_err(io::Error::other)?;
    fs::write(path, data)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveProfile {
    /// Settings given on the command line (may be saved by the caller).
    Direct(DeviceConfig),
    /// Loaded from an existing profile, with any command-line overrides applied.
    Loaded(DeviceConfig),
    /// A profile was named but does not exist and no host was given.
    Missing(String),
    /// Nothing given: the local simulator address.
    Default(DeviceConfig),
}

#[derive(Debug, Clone, Default)]
pub struct ProfileRequest {
    pub profile_name: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub poll_interval: Option<PollInterval>,
}

impl ProfileRequest {
    pub fn resolve(self, pf: &ProfilesFile) -> ResolveProfile {
        // Case: only profile name given -> try load
        if self.host.is_none() {
            if let Some(name) = self.profile_name.as_ref() {
                return match pf.profiles.get(name) {
                    Some(entry) => ResolveProfile::Loaded(self.overlay(entry.clone())),
                    None => ResolveProfile::Missing(name.clone()),
                };
            }
            return ResolveProfile::Default(self.overlay(DeviceConfig::default()));
        }
        ResolveProfile::Direct(self.overlay(DeviceConfig::default()))
    }

    fn overlay(&self, mut cfg: DeviceConfig) -> DeviceConfig {
        if let Some(h) = &self.host {
            cfg.host = h.trim().to_string();
        }
        if let Some(p) = &self.port {
            cfg.port = p.trim().to_string();
        }
        if let Some(i) = self.poll_interval {
            cfg.poll_interval = i;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(name: &str, host: &str) -> ProfilesFile {
        let mut pf = ProfilesFile::default();
        pf.profiles.insert(
            name.into(),
            DeviceConfig {
                host: host.into(),
                port: "9000".into(),
                poll_interval: PollInterval::TwoSeconds,
            },
        );
        pf
    }

    #[test]
    fn profile_only_loads_entry() {
        let pf = file_with("bench", "10.0.0.5");
        let req = ProfileRequest {
            profile_name: Some("bench".into()),
            ..Default::default()
        };
        match req.resolve(&pf) {
            ResolveProfile::Loaded(cfg) => {
                assert_eq!(cfg.device_address(), "10.0.0.5:9000");
                assert_eq!(cfg.poll_interval, PollInterval::TwoSeconds);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn overrides_apply_on_top_of_profile() {
        let pf = file_with("bench", "10.0.0.5");
        let req = ProfileRequest {
            profile_name: Some("bench".into()),
            port: Some("9100".into()),
            ..Default::default()
        };
        assert!(matches!(req.resolve(&pf), ResolveProfile::Loaded(c) if c.port == "9100"));
    }

    #[test]
    fn unknown_profile_is_missing() {
        let req = ProfileRequest {
            profile_name: Some("nope".into()),
            ..Default::default()
        };
        assert_eq!(
            req.resolve(&ProfilesFile::default()),
            ResolveProfile::Missing("nope".into())
        );
    }

    #[test]
    fn host_wins_over_profile_lookup() {
        let pf = file_with("bench", "10.0.0.5");
        let req = ProfileRequest {
            profile_name: Some("bench".into()),
            host: Some("192.168.1.9".into()),
            ..Default::default()
        };
        match req.resolve(&pf) {
            ResolveProfile::Direct(cfg) => assert_eq!(cfg.device_address(), "192.168.1.9:8001"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nothing_given_targets_simulator() {
        assert_eq!(
            ProfileRequest::default().resolve(&ProfilesFile::default()),
            ResolveProfile::Default(DeviceConfig::default())
        );
    }
}
