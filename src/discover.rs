use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    pub sources: Vec<PathBuf>,
    pub class_files: Vec<PathBuf>,
    pub jars: Vec<PathBuf>,
}

impl Inputs {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.class_files.is_empty() && self.jars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len() + self.class_files.len() + self.jars.len()
    }

    fn push(&mut self, path: PathBuf) {
        match InputKind::of(&path) {
            Some(InputKind::Source) => self.sources.push(path),
            Some(InputKind::Class) => self.class_files.push(path),
            Some(InputKind::Jar) => self.jars.push(path),
            None => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Source,
    Class,
    Jar,
}

impl InputKind {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext {
            "java" => Some(Self::Source),
            "class" => {
                let stem = path.file_stem()?.to_str()?;
                let own_type =
                    !stem.contains('$') && stem != "module-info" && stem != "package-info";
                own_type.then_some(Self::Class)
            }
            "jar" => Some(Self::Jar),
            _ => None,
        }
    }
}

/// Expands every root into the Java inputs it contains. Directories are
/// walked in parallel; the result is sorted so repeated runs agree.
pub fn discover_inputs(roots: &[PathBuf]) -> Result<Inputs> {
    let mut inputs = Inputs::default();

    for root in roots {
        if !root.exists() {
            bail!("Input path does not exist: {}", root.display());
        }
        if root.is_dir() {
            for path in walk(root)? {
                inputs.push(path);
            }
        } else {
            inputs.push(root.clone());
        }
    }

    for list in [
        &mut inputs.sources,
        &mut inputs.class_files,
        &mut inputs.jars,
    ] {
        list.sort();
        list.dedup();
    }
    Ok(inputs)
}

fn walk(base_path: &Path) -> Result<Vec<PathBuf>> {
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && InputKind::of(path).is_some() {
                        let _ = tx.send(Ok(path.to_path_buf()));
                    }
                }
                // An unreadable directory would hide types from the scan.
                Err(e) => {
                    let _ = tx.send(Err(e));
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    rx.iter()
        .collect::<std::result::Result<Vec<_>, ignore::Error>>()
        .with_context(|| format!("Failed to walk {}", base_path.display()))
}
