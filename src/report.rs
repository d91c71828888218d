//! JSON and HTML reports of missing-annotation findings.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::scanner::ScanResult;

pub const JSON_REPORT: &str = "MissingAnnotationEntityList.json";
pub const HTML_REPORT: &str = "MissingAnnotationEntityList.html";

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang='en'>
  <head>
    <meta charset='UTF-8' />
    <title>srv-ann-check report</title>
    <link
      href='https://unpkg.com/gridjs/dist/theme/mermaid.min.css'
      rel='stylesheet'
    />
  </head>
  <body>
    <h1>Report srv-ann-check</h1>
    <h3>Missing Annotation Report</h3>
    <h3>Date : @DATE@</h3>
    <div id='wrapper'></div>

    <script src='https://unpkg.com/gridjs/dist/gridjs.umd.js'></script>
    <script>
      new gridjs.Grid({
        columns: ['Class', 'Method'],
        sort: true,
        search: true,
        data: @REPORT@
      }).render(document.getElementById('wrapper'));
    </script>
  </body>
</html>
"#;

#[derive(Debug, Serialize)]
struct ReportEntry<'a> {
    class: &'a str,
    method: &'a str,
}

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub html: PathBuf,
}

pub fn render_json(result: &ScanResult) -> Result<String> {
    let entries: Vec<ReportEntry<'_>> = result
        .missing_annotations()
        .map(|(class, method)| ReportEntry { class, method })
        .collect();
    serde_json::to_string_pretty(&entries).context("Failed to serialize JSON report")
}

pub fn render_html(result: &ScanResult, generated_at: &str) -> Result<String> {
    let rows: Vec<[&str; 2]> = result
        .missing_annotations()
        .map(|(class, method)| [class, method])
        .collect();
    let data = serde_json::to_string(&rows).context("Failed to serialize report rows")?;
    // Keep the payload from closing the surrounding <script>.
    let data = data.replace("</", "<\\/");

    Ok(HTML_TEMPLATE
        .replace("@DATE@", &html_escape(generated_at))
        .replace("@REPORT@", &data))
}

/// Writes both reports into `dir`, replacing earlier reports. Nothing else in
/// `dir` is touched.
pub fn write_reports(dir: &Path, result: &ScanResult, generated_at: &str) -> Result<ReportPaths> {
    let paths = ReportPaths {
        json: dir.join(JSON_REPORT),
        html: dir.join(HTML_REPORT),
    };
    for stale in [&paths.json, &paths.html] {
        if stale.is_file() {
            std::fs::remove_file(stale)
                .with_context(|| format!("Failed to remove old report: {}", stale.display()))?;
        }
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory: {}", dir.display()))?;

    std::fs::write(&paths.json, render_json(result)?)
        .with_context(|| format!("Failed to write {}", paths.json.display()))?;
    std::fs::write(&paths.html, render_html(result, generated_at)?)
        .with_context(|| format!("Failed to write {}", paths.html.display()))?;

    Ok(paths)
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
