use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

#[derive(Debug, Clone, Default)]
pub struct JarContents {
    /// `(entry name, source text)` for every `.java` entry.
    pub sources: Vec<(String, String)>,
    /// Top-level compiled classes, as qualified names.
    pub classes: Vec<String>,
}

pub fn read_jar(jar_path: &Path) -> Result<JarContents> {
    let file =
        File::open(jar_path).with_context(|| format!("Failed to open jar: {}", jar_path.display()))?;
    // SAFETY: The file is opened read-only and outlives the mapping.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to mmap jar: {}", jar_path.display()))?;
    let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
        .with_context(|| format!("Failed to read zip structure: {}", jar_path.display()))?;

    let mut contents = JarContents::default();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read entry #{i} of {}", jar_path.display()))?;
        let name = entry.name().to_string();

        if let Some(class_name) = class_entry_name(&name) {
            contents.classes.push(class_name);
        } else if name.ends_with(".java") {
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .with_context(|| format!("Failed to read {name} from {}", jar_path.display()))?;
            let source = String::from_utf8_lossy(&bytes).into_owned();
            contents.sources.push((name, source));
        }
    }

    contents.classes.sort();
    contents.classes.dedup();
    Ok(contents)
}

/// Maps `a/b/C.class` to `a.b.C`. Inner classes, `module-info` and
/// `package-info` are not types of their own here.
pub fn class_entry_name(entry: &str) -> Option<String> {
    let stem = entry.strip_suffix(".class")?;
    if stem.contains('$') || stem.ends_with("module-info") || stem.ends_with("package-info") {
        return None;
    }
    Some(stem.replace(['/', '\\'], "."))
}
