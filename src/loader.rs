//! Artifact loader: materializes the symbol table the scanner consumes.
//!
//! Sources are parsed directly; compiled classes (loose or in jars) are
//! decompiled with CFR first. Every input is parsed in parallel, then all
//! compilation units are resolved together so that meta-annotations and
//! superclasses declared outside the scanned package still count. Only types
//! inside the scope package are returned.

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::archive::read_jar;
use crate::cfr::Cfr;
use crate::discover::Inputs;
use crate::parse::parse_decompiled_output;
use crate::resolve::{ResolveOptions, resolve};
use crate::scanner::ScanConfig;
use crate::structure::{CompilationUnit, parse_compilation_unit};
use crate::symbol::TypeSymbol;

#[derive(Debug, Clone)]
enum Job<'a> {
    Source(&'a Path),
    ClassFile(&'a Path),
    Jar(&'a Path),
}

#[derive(Debug, Clone)]
pub struct Loader {
    scope: String,
    cfr: Option<Cfr>,
    options: ResolveOptions,
}

impl Loader {
    pub fn new(config: &ScanConfig) -> Self {
        let markers = &config.markers;
        let mut known = vec![
            markers.service.qualified_name().to_string(),
            markers.transactional.qualified_name().to_string(),
            markers.guard.qualified_name().to_string(),
        ];
        if let Some(ignore) = &config.ignore_annotation {
            known.push(ignore.qualified_name().to_string());
        }

        Self {
            scope: config.scope.trim().to_string(),
            cfr: None,
            options: ResolveOptions {
                known,
                inheritable: vec![markers.transactional.qualified_name().to_string()],
            },
        }
    }

    pub fn with_cfr(mut self, cfr: Cfr) -> Self {
        self.cfr = Some(cfr);
        self
    }

    pub fn in_scope(&self, qualified_name: &str) -> bool {
        qualified_name
            .strip_prefix(self.scope.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }

    /// Whether any compiled input holds classes of the scope package, i.e.
    /// whether [`Loader::load`] will need CFR.
    pub fn needs_decompiler(&self, inputs: &Inputs) -> bool {
        inputs.class_files.iter().any(|p| self.class_file_in_scope(p))
            || inputs.jars.iter().any(|jar| {
                read_jar(jar).is_ok_and(|c| c.classes.iter().any(|name| self.in_scope(name)))
            })
    }

    /// Loads every input. Resolved in-scope types and the inputs that failed
    /// to load (as `Err`) come back in input order.
    pub fn load(&self, inputs: &Inputs) -> Vec<Result<TypeSymbol>> {
        let mut jobs: Vec<Job<'_>> = Vec::with_capacity(inputs.len());
        jobs.extend(inputs.sources.iter().map(|p| Job::Source(p)));
        jobs.extend(
            inputs
                .class_files
                .iter()
                .filter(|p| self.class_file_in_scope(p))
                .map(|p| Job::ClassFile(p)),
        );
        jobs.extend(inputs.jars.iter().map(|p| Job::Jar(p)));

        let loaded: Vec<Result<Vec<CompilationUnit>>> =
            jobs.par_iter().map(|job| self.run_job(job)).collect();

        let mut units = Vec::new();
        let mut origin: HashMap<String, usize> = HashMap::new();
        let mut failures = Vec::new();
        for (idx, result) in loaded.into_iter().enumerate() {
            match result {
                Ok(batch) => {
                    for unit in &batch {
                        for decl in &unit.types {
                            origin.entry(unit.qualify(&decl.name)).or_insert(idx);
                        }
                    }
                    units.extend(batch);
                }
                Err(e) => failures.push((idx, e)),
            }
        }
        tracing::debug!(
            units = units.len(),
            failures = failures.len(),
            "parsed compilation units"
        );

        let mut items: Vec<(usize, Result<TypeSymbol>)> = resolve(&units, &self.options)
            .into_iter()
            .filter(|symbol| self.in_scope(&symbol.qualified_name))
            .map(|symbol| {
                let idx = origin
                    .get(&symbol.qualified_name)
                    .copied()
                    .unwrap_or(usize::MAX);
                (idx, Ok(symbol))
            })
            .collect();
        items.extend(failures.into_iter().map(|(idx, e)| (idx, Err(e))));
        // Stable: types of one input keep their declaration order.
        items.sort_by_key(|(idx, _)| *idx);
        items.into_iter().map(|(_, item)| item).collect()
    }

    fn run_job(&self, job: &Job<'_>) -> Result<Vec<CompilationUnit>> {
        match job {
            Job::Source(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read source: {}", path.display()))?;
                // Legacy sources are often Latin-1; only declarations matter here.
                let source = String::from_utf8_lossy(&bytes);
                let unit = parse_compilation_unit(&source)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                Ok(vec![unit])
            }
            Job::ClassFile(path) => self.decompile(path),
            Job::Jar(path) => self.load_jar(path),
        }
    }

    fn load_jar(&self, jar: &Path) -> Result<Vec<CompilationUnit>> {
        let contents = read_jar(jar)?;
        let mut units = Vec::with_capacity(contents.sources.len());
        for (entry, source) in &contents.sources {
            let unit = parse_compilation_unit(source)
                .with_context(|| format!("Failed to parse {entry} in {}", jar.display()))?;
            units.push(unit);
        }

        if contents.classes.iter().any(|name| self.in_scope(name)) {
            units.extend(self.decompile(jar)?);
        } else if !contents.classes.is_empty() {
            tracing::debug!(jar = %jar.display(), "no classes in scope, skipping decompilation");
        }
        Ok(units)
    }

    fn decompile(&self, input: &Path) -> Result<Vec<CompilationUnit>> {
        let cfr = self.cfr.as_ref().ok_or_else(|| {
            anyhow!(
                "{} contains compiled classes of {} but no CFR decompiler is configured",
                input.display(),
                self.scope
            )
        })?;
        tracing::info!(
            input = %input.display(),
            cfr = %cfr.jar_path().display(),
            "decompiling"
        );
        let output = cfr.decompile(input)?;

        parse_decompiled_output(&output)
            .into_iter()
            .map(|class| {
                parse_compilation_unit(&class.content).with_context(|| {
                    format!(
                        "Failed to parse decompiled {} from {}",
                        class.class_name,
                        input.display()
                    )
                })
            })
            .collect()
    }

    fn class_file_in_scope(&self, path: &Path) -> bool {
        let needle = format!("/{}/", self.scope.replace('.', "/"));
        path.to_string_lossy().replace('\\', "/").contains(&needle)
    }
}

/// Reads a symbol table produced by an external loader: a JSON array of
/// type symbols.
pub fn load_symbol_table(path: &Path) -> Result<Vec<TypeSymbol>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read symbol table: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse symbol table: {}", path.display()))
}
