use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const JAVA_ENV: &str = "SRV_ANN_CHECK_JAVA";

fn java_command(args: &[&str]) -> Result<std::process::Output> {
    let java_bin = std::env::var(JAVA_ENV).unwrap_or_else(|_| "java".to_string());

    #[cfg(windows)]
    {
        let lower = java_bin.to_ascii_lowercase();
        if lower.ends_with(".cmd") || lower.ends_with(".bat") {
            return Command::new("cmd")
                .arg("/C")
                .arg(&java_bin)
                .args(args)
                .output()
                .context("Failed to execute java (ensure JRE/JDK is installed)");
        }
    }

    Command::new(&java_bin)
        .args(args)
        .output()
        .context("Failed to execute java (ensure JRE/JDK is installed)")
}

/// CFR decompiler driver. Decompiled sources keep runtime-retained
/// annotations, which is all the scanner needs from compiled classes.
#[derive(Debug, Clone)]
pub struct Cfr {
    cfr_jar: PathBuf,
}

impl Cfr {
    pub fn new(cfr_jar: PathBuf) -> Self {
        Self { cfr_jar }
    }

    pub fn jar_path(&self) -> &Path {
        &self.cfr_jar
    }

    /// Decompiles every class of a jar, or a single `.class` file.
    pub fn decompile(&self, input: &Path) -> Result<String> {
        let output = java_command(&[
            "-jar",
            self.cfr_jar
                .to_str()
                .context("cfr.jar path is not valid UTF-8")?,
            input.to_str().context("input path is not valid UTF-8")?,
            "--silent",
            "true",
            "--comments",
            "false",
        ])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "CFR decompilation of {} failed: {}",
                input.display(),
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
