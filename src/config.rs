//! Configuration file loading and effective settings resolution.
//!
//! Precedence: CLI > `srv-ann-check.toml` > defaults. Blank strings count as
//! unset, so an empty `package = ""` still ends in a configuration error from
//! the scanner rather than a scan of everything.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, ScanArgs};
use crate::scanner::ScanConfig;

pub const CONFIG_FILE: &str = "srv-ann-check.toml";
pub const SKIP_ENV: &str = "SRV_ANN_CHECK_SKIP";

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub package: Option<String>,
    #[serde(default)]
    pub ignore_classes: Vec<String>,
    pub ignore_annotation: Option<String>,
    #[serde(default)]
    pub paths: Vec<PathBuf>,
    pub symbols: Option<PathBuf>,
    #[serde(default)]
    pub report: ReportCfg,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ReportCfg {
    pub dir: Option<PathBuf>,
    pub enabled: Option<bool>,
}

/// Fully-resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Effective {
    pub scan: ScanConfig,
    pub paths: Vec<PathBuf>,
    pub symbols: Option<PathBuf>,
    /// `None` when reports are disabled.
    pub report_dir: Option<PathBuf>,
}

/// Reads the explicit `--config` file, or `srv-ann-check.toml` in `cwd` if
/// one exists.
pub fn load_file_config(explicit: Option<&Path>, cwd: &Path) -> Result<FileConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let default = cwd.join(CONFIG_FILE);
            if !default.exists() {
                return Ok(FileConfig::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn resolve_effective(
    args: &ScanArgs,
    file: FileConfig,
    report_dir: Option<&Path>,
    no_report: bool,
    cwd: &Path,
) -> Effective {
    let scope = non_blank(args.package.clone())
        .or_else(|| non_blank(file.package))
        .unwrap_or_default();
    let mut scan = ScanConfig::new(scope);

    let ignore_classes = if args.ignore_classes.is_empty() {
        file.ignore_classes
    } else {
        args.ignore_classes.clone()
    };
    for class in ignore_classes.into_iter().filter_map(|c| non_blank(Some(c))) {
        scan = scan.ignore_type(class);
    }

    if let Some(ann) =
        non_blank(args.ignore_annotation.clone()).or_else(|| non_blank(file.ignore_annotation))
    {
        scan = scan.ignore_annotation(ann);
    }

    let paths = if args.paths.is_empty() {
        file.paths
    } else {
        args.paths.clone()
    };

    let reports_enabled = !no_report && file.report.enabled.unwrap_or(true);
    let report_dir = reports_enabled.then(|| {
        report_dir
            .map(Path::to_path_buf)
            .or(file.report.dir)
            .unwrap_or_else(|| default_report_dir(cwd))
    });

    Effective {
        scan,
        paths: paths.into_iter().map(|p| absolutize(cwd, p)).collect(),
        symbols: args.symbols.clone().or(file.symbols).map(|p| absolutize(cwd, p)),
        report_dir: report_dir.map(|p| absolutize(cwd, p)),
    }
}

pub fn default_report_dir(cwd: &Path) -> PathBuf {
    cwd.join("target").join("srv-ann-check")
}

pub fn skip_requested(flag: bool) -> bool {
    flag || env::var(SKIP_ENV).is_ok_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn absolutize(cwd: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

pub fn resolve_cfr_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.cfr.clone() {
        return Ok(p);
    }

    if let Ok(p) = env::var("CFR_JAR") {
        return Ok(PathBuf::from(p));
    }

    let default_path = srv_ann_check_home()?.join("tools").join("cfr.jar");
    if default_path.exists() {
        return Ok(default_path);
    }

    install_cfr_if_missing(&default_path)?;
    Ok(default_path)
}

fn srv_ann_check_home() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::cache_dir)
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve data directory"))?;
    Ok(base.join("srv-ann-check"))
}

fn install_cfr_if_missing(target_path: &Path) -> Result<()> {
    if target_path.exists() {
        return Ok(());
    }

    let url = "https://github.com/leibnitz27/cfr/releases/download/0.152/cfr-0.152.jar";
    if let Some(parent) = target_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    tracing::warn!(
        target = %target_path.display(),
        "CFR not found, downloading"
    );
    let status = std::process::Command::new("curl")
        .args([
            "-L",
            "--fail",
            "--silent",
            "--show-error",
            "-o",
            target_path
                .to_str()
                .context("cfr.jar target path is not valid UTF-8")?,
            url,
        ])
        .status()
        .context(
            "Failed to execute curl (ensure curl is installed, or use --cfr to specify cfr.jar)",
        )?;

    if !status.success() {
        anyhow::bail!("Failed to download CFR. You can use --cfr to specify local cfr.jar");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use clap::Parser;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "srv_ann_check_config_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn scan_args(argv: &[&str]) -> ScanArgs {
        let mut full = vec!["srv-ann-check", "check"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Check { scan, .. } => scan,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn file_config_parses_all_sections() {
        let file: FileConfig = toml::from_str(
            r#"
package = "com.acme"
ignore_classes = ["com.acme.Legacy"]
ignore_annotation = "com.acme.NoAuthCheck"
paths = ["src/main/java"]

[report]
dir = "build/reports"
enabled = true
"#,
        )
        .unwrap();
        assert_eq!(file.package.as_deref(), Some("com.acme"));
        assert_eq!(file.ignore_classes, vec!["com.acme.Legacy"]);
        assert_eq!(file.paths, vec![PathBuf::from("src/main/java")]);
        assert_eq!(file.report.dir, Some(PathBuf::from("build/reports")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<FileConfig>("pkg = \"com.acme\"").is_err());
    }

    #[test]
    fn cli_overrides_file_and_paths_are_absolutized() {
        let cwd = PathBuf::from("/work");
        let file = FileConfig {
            package: Some("com.file".into()),
            ignore_classes: vec!["com.file.Legacy".into()],
            ignore_annotation: Some("com.file.Skip".into()),
            paths: vec![PathBuf::from("src")],
            ..FileConfig::default()
        };
        let args = scan_args(&[
            "--package",
            "com.cli",
            "--ignore-class",
            "com.cli.Old",
            "classes",
        ]);

        let eff = resolve_effective(&args, file, None, false, &cwd);
        assert_eq!(eff.scan.scope, "com.cli");
        assert!(eff.scan.ignore_types.contains("com.cli.Old"));
        assert!(!eff.scan.ignore_types.contains("com.file.Legacy"));
        assert_eq!(
            eff.scan.ignore_annotation.as_ref().map(|a| a.qualified_name()),
            Some("com.file.Skip")
        );
        assert_eq!(eff.paths, vec![PathBuf::from("/work/classes")]);
        assert_eq!(
            eff.report_dir,
            Some(PathBuf::from("/work/target/srv-ann-check"))
        );
    }

    #[test]
    fn blank_values_count_as_unset() {
        let file = FileConfig {
            package: Some("   ".into()),
            ignore_annotation: Some("".into()),
            ..FileConfig::default()
        };
        let eff = resolve_effective(&ScanArgs::default(), file, None, false, Path::new("/w"));
        assert_eq!(eff.scan.scope, "");
        assert!(eff.scan.ignore_annotation.is_none());
        assert!(eff.scan.validate().is_err());
    }

    #[test]
    fn reports_can_be_disabled_from_either_side() {
        let disabled_in_file = FileConfig {
            report: ReportCfg {
                dir: None,
                enabled: Some(false),
            },
            ..FileConfig::default()
        };
        let eff = resolve_effective(
            &ScanArgs::default(),
            disabled_in_file,
            Some(Path::new("out")),
            false,
            Path::new("/w"),
        );
        assert!(eff.report_dir.is_none());

        let eff = resolve_effective(
            &ScanArgs::default(),
            FileConfig::default(),
            Some(Path::new("out")),
            true,
            Path::new("/w"),
        );
        assert!(eff.report_dir.is_none());
    }

    #[test]
    fn load_file_config_defaults_when_absent_and_reads_cwd_file() {
        let dir = temp_dir("cwd");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(load_file_config(None, &dir).unwrap().package.is_none());

        std::fs::write(dir.join(CONFIG_FILE), "package = \"com.acme\"\n").unwrap();
        let file = load_file_config(None, &dir).unwrap();
        assert_eq!(file.package.as_deref(), Some("com.acme"));

        let missing = dir.join("nope.toml");
        assert!(load_file_config(Some(&missing), &dir).is_err());

        let _ = std::fs::remove_dir_all(dir);
    }
}
