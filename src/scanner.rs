//! Scan orchestration.
//!
//! [`scan`] validates the configuration, materializes the symbol input,
//! selects the in-scope types, audits them and collects the findings. It is a
//! pure function: no logging, no files, no process exit. An empty
//! [`ScanResult::findings`] means the artifact is compliant.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::audit::audit;
use crate::error::{Error, Result};
use crate::filter::{FilterSummary, select_in_scope};
use crate::finding::{Finding, FindingCollector};
use crate::symbol::{AnnotationRef, SymbolSet, TypeSymbol};

pub const SERVICE_MARKER: &str = "org.springframework.stereotype.Service";
pub const TRANSACTIONAL_MARKER: &str = "org.springframework.transaction.annotation.Transactional";
pub const GUARD_ANNOTATION: &str = "org.springframework.security.access.prepost.PreAuthorize";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub service: AnnotationRef,
    pub transactional: AnnotationRef,
    pub guard: AnnotationRef,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            service: AnnotationRef::new(SERVICE_MARKER),
            transactional: AnnotationRef::new(TRANSACTIONAL_MARKER),
            guard: AnnotationRef::new(GUARD_ANNOTATION),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Package the symbol set was loaded from. Opaque to the scanner beyond
    /// being required.
    pub scope: String,
    pub markers: Markers,
    pub ignore_annotation: Option<AnnotationRef>,
    pub ignore_types: BTreeSet<String>,
}

impl ScanConfig {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            markers: Markers::default(),
            ignore_annotation: None,
            ignore_types: BTreeSet::new(),
        }
    }

    pub fn ignore_type(mut self, qualified_name: impl Into<String>) -> Self {
        self.ignore_types.insert(qualified_name.into());
        self
    }

    pub fn ignore_annotation(mut self, qualified_name: impl Into<String>) -> Self {
        self.ignore_annotation = Some(AnnotationRef::new(qualified_name));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.scope.trim().is_empty() {
            return Err(Error::configuration("package name can't be blank"));
        }
        let markers = [
            ("service marker", &self.markers.service),
            ("transactional marker", &self.markers.transactional),
            ("guard annotation", &self.markers.guard),
        ];
        for (what, marker) in markers {
            if marker.is_blank() {
                return Err(Error::configuration(format!("{what} can't be blank")));
            }
        }
        if self.ignore_annotation.as_ref().is_some_and(AnnotationRef::is_blank) {
            return Err(Error::configuration("ignore annotation can't be blank"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<String>,
    pub scanned_type_count: usize,
    pub in_scope_type_count: usize,
    pub filter: FilterSummary,
}

impl ScanResult {
    pub fn is_compliant(&self) -> bool {
        self.findings.is_empty()
    }

    /// `(class, method)` pairs of the missing-annotation findings only.
    pub fn missing_annotations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.findings.iter().filter_map(|f| match f {
            Finding::MissingAnnotation { class, method } => Some((class.as_str(), method.as_str())),
            Finding::NoMethods { .. } => None,
        })
    }
}

/// Runs one scan over a fallible symbol input.
///
/// The first item that fails aborts the scan with [`Error::Scan`]: a partial
/// symbol set would report a missing type as compliant.
pub fn scan<I, E>(symbols: I, config: &ScanConfig) -> Result<ScanResult>
where
    I: IntoIterator<Item = std::result::Result<TypeSymbol, E>>,
    E: Into<crate::symbol::SymbolError>,
{
    config.validate()?;

    let mut set = SymbolSet::new();
    for (position, item) in symbols.into_iter().enumerate() {
        let symbol = item.map_err(Error::scan)?;
        if symbol.qualified_name.trim().is_empty() {
            return Err(Error::scan(format!(
                "type at position {position} has an empty qualified name"
            )));
        }
        set.insert(symbol);
    }

    Ok(run(&set, config))
}

/// Runs one scan over an already materialized symbol set.
pub fn scan_symbols(symbols: &SymbolSet, config: &ScanConfig) -> Result<ScanResult> {
    config.validate()?;
    if let Some(symbol) = symbols.iter().find(|t| t.qualified_name.trim().is_empty()) {
        return Err(Error::scan(format!(
            "type with an empty qualified name ({} methods)",
            symbol.methods.len()
        )));
    }
    Ok(run(symbols, config))
}

fn run(symbols: &SymbolSet, config: &ScanConfig) -> ScanResult {
    let in_scope = select_in_scope(symbols, config);

    let per_type: Vec<Vec<Finding>> = in_scope
        .types
        .par_iter()
        .map(|symbol| audit(symbol, config))
        .collect();

    let mut collector = FindingCollector::new();
    for findings in per_type {
        collector.extend(findings);
    }
    let (findings, diagnostics) = collector.finish();

    ScanResult {
        findings,
        diagnostics,
        scanned_type_count: symbols.len(),
        in_scope_type_count: in_scope.types.len(),
        filter: in_scope.summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::MethodSymbol;

    const NONE: [&str; 0] = [];

    fn service(name: &str) -> TypeSymbol {
        TypeSymbol::new(name, [SERVICE_MARKER, TRANSACTIONAL_MARKER])
    }

    fn ok(types: Vec<TypeSymbol>) -> Vec<std::result::Result<TypeSymbol, String>> {
        types.into_iter().map(Ok).collect()
    }

    #[test]
    fn unguarded_method_is_reported() {
        let t1 = service("com.acme.T1")
            .with_method(MethodSymbol::new("m1", [GUARD_ANNOTATION]))
            .with_method(MethodSymbol::new("m2", NONE));

        let result = scan(ok(vec![t1]), &ScanConfig::new("com.acme")).unwrap();

        assert_eq!(
            result.findings,
            vec![Finding::missing_annotation("com.acme.T1", "m2")]
        );
        assert_eq!(result.diagnostics, vec!["Annotation missing for com.acme.T1.m2"]);
        assert_eq!(result.in_scope_type_count, 1);
    }

    #[test]
    fn service_without_transactional_is_out_of_scope() {
        let t2 = TypeSymbol::new("com.acme.T2", [SERVICE_MARKER])
            .with_method(MethodSymbol::new("m", NONE));

        let result = scan(ok(vec![t2]), &ScanConfig::new("com.acme")).unwrap();

        assert!(result.is_compliant());
        assert_eq!(result.scanned_type_count, 1);
        assert_eq!(result.in_scope_type_count, 0);
    }

    #[test]
    fn ignored_type_is_never_reported() {
        let t3 = service("com.acme.T3").with_method(MethodSymbol::new("m3", NONE));
        let config = ScanConfig::new("com.acme").ignore_type("com.acme.T3");

        let result = scan(ok(vec![t3]), &config).unwrap();

        assert!(result.findings.is_empty());
        assert_eq!(result.filter.ignored, vec!["com.acme.T3".to_string()]);
    }

    #[test]
    fn type_without_methods_yields_no_methods_finding() {
        let result = scan(ok(vec![service("com.acme.T4")]), &ScanConfig::new("com.acme")).unwrap();

        assert_eq!(result.findings, vec![Finding::no_methods("com.acme.T4")]);
        assert_eq!(result.missing_annotations().count(), 0);
    }

    #[test]
    fn ignore_annotation_marks_method_compliant() {
        let t5 = service("com.acme.T5").with_method(MethodSymbol::new("m5", ["X"]));
        let config = ScanConfig::new("com.acme").ignore_annotation("X");

        let result = scan(ok(vec![t5]), &config).unwrap();
        assert!(result.is_compliant());
    }

    #[test]
    fn no_candidates_is_a_successful_empty_scan() {
        let types = vec![
            TypeSymbol::new("a.Plain", NONE).with_method(MethodSymbol::new("m", NONE)),
            TypeSymbol::new("a.Tx", [TRANSACTIONAL_MARKER]),
        ];
        let result = scan(ok(types), &ScanConfig::new("a")).unwrap();
        assert!(result.is_compliant());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn findings_follow_type_then_method_order_and_are_repeatable() {
        let types: Vec<TypeSymbol> = (0..64)
            .map(|i| {
                service(&format!("a.S{i:02}"))
                    .with_method(MethodSymbol::new("first", NONE))
                    .with_method(MethodSymbol::new("second", NONE))
            })
            .collect();
        let config = ScanConfig::new("a");

        let first = scan(ok(types.clone()), &config).unwrap();
        let second = scan(ok(types), &config).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.findings.len(), 128);
        assert_eq!(first.findings[0], Finding::missing_annotation("a.S00", "first"));
        assert_eq!(first.findings[1], Finding::missing_annotation("a.S00", "second"));
        assert_eq!(first.findings[127], Finding::missing_annotation("a.S63", "second"));
    }

    #[test]
    fn duplicate_types_are_audited_once() {
        let t = service("a.Dup").with_method(MethodSymbol::new("m", NONE));
        let result = scan(ok(vec![t.clone(), t]), &ScanConfig::new("a")).unwrap();
        assert_eq!(result.scanned_type_count, 1);
        assert_eq!(result.findings.len(), 1);
    }

    #[test]
    fn blank_scope_is_a_configuration_error() {
        let err = scan(ok(vec![service("a.S")]), &ScanConfig::new("  ")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn blank_marker_is_a_configuration_error() {
        let mut config = ScanConfig::new("a");
        config.markers.guard = AnnotationRef::new("");
        let err = scan_symbols(&SymbolSet::new(), &config).unwrap_err();
        assert!(err.to_string().contains("guard annotation"));
    }

    #[test]
    fn configuration_is_checked_before_symbols_are_read() {
        let symbols = vec![Err::<TypeSymbol, _>("unreadable".to_string())];
        let err = scan(symbols, &ScanConfig::new("")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn unreadable_symbol_aborts_the_whole_scan() {
        let symbols = vec![
            Ok(service("a.Good").with_method(MethodSymbol::new("m", NONE))),
            Err("cannot resolve a.Broken".to_string()),
        ];
        let err = scan(symbols, &ScanConfig::new("a")).unwrap_err();
        match err {
            Error::Scan { source } => assert!(source.to_string().contains("a.Broken")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_qualified_name_aborts_the_scan() {
        let err = scan(ok(vec![TypeSymbol::new("", NONE)]), &ScanConfig::new("a")).unwrap_err();
        assert!(matches!(err, Error::Scan { .. }));
    }
}
