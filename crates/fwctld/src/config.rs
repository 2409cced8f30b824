//! Daemon arguments and startup validation.

use clap::Parser;
use std::path::PathBuf;

use crate::error::{FwError, FwResult};

/// P4Runtime firewall controller.
#[derive(Parser, Debug)]
#[command(name = "fwctld")]
#[command(author, version, about, long_about = None)]
pub struct ControllerArgs {
    /// p4info proto in text format from p4c
    #[arg(long, default_value = "./build/firewall.p4info")]
    pub p4info: PathBuf,

    /// BMv2 JSON file from p4c
    #[arg(long = "bmv2-json", default_value = "./build/firewall.json")]
    pub bmv2_json: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    pub log_level: String,
}

impl ControllerArgs {
    /// Checks that both compiled artifacts exist. The daemon refuses to
    /// start without them.
    pub fn validate(&self) -> FwResult<()> {
        if !self.p4info.is_file() {
            return Err(FwError::missing_artifact("p4info", self.p4info.clone()));
        }
        if !self.bmv2_json.is_file() {
            return Err(FwError::missing_artifact("BMv2 JSON", self.bmv2_json.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn args(p4info: PathBuf, bmv2_json: PathBuf) -> ControllerArgs {
        ControllerArgs {
            p4info,
            bmv2_json,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_validate_both_present() {
        let dir = tempfile::tempdir().unwrap();
        let p4info = dir.path().join("firewall.p4info");
        let bmv2 = dir.path().join("firewall.json");
        fs::write(&p4info, "pkg_info {}").unwrap();
        fs::write(&bmv2, "{}").unwrap();

        assert!(args(p4info, bmv2).validate().is_ok());
    }

    #[test]
    fn test_validate_missing_p4info() {
        let dir = tempfile::tempdir().unwrap();
        let bmv2 = dir.path().join("firewall.json");
        fs::write(&bmv2, "{}").unwrap();

        let err = args(dir.path().join("absent.p4info"), bmv2)
            .validate()
            .unwrap_err();
        assert!(matches!(err, FwError::MissingArtifact { role: "p4info", .. }));
    }

    #[test]
    fn test_validate_missing_bmv2_json() {
        let dir = tempfile::tempdir().unwrap();
        let p4info = dir.path().join("firewall.p4info");
        fs::write(&p4info, "pkg_info {}").unwrap();

        let err = args(p4info, dir.path().join("absent.json"))
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            FwError::MissingArtifact { role: "BMv2 JSON", .. }
        ));
    }

    #[test]
    fn test_defaults() {
        let args = ControllerArgs::parse_from(["fwctld"]);
        assert_eq!(args.p4info, PathBuf::from("./build/firewall.p4info"));
        assert_eq!(args.bmv2_json, PathBuf::from("./build/firewall.json"));
        assert_eq!(args.log_level, "info");
    }
}
