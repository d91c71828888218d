use serde::Serialize;

use crate::scanner::ScanConfig;
use crate::symbol::{SymbolSet, TypeSymbol};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub service_types: usize,
    pub transactional_types: usize,
    /// Types carrying both markers, before ignore-list removal.
    pub candidates: usize,
    /// Candidates dropped because they are on the ignore list.
    pub ignored: Vec<String>,
}

#[derive(Debug)]
pub struct InScope<'a> {
    pub types: Vec<&'a TypeSymbol>,
    pub summary: FilterSummary,
}

/// Selects the types that carry both the service and the transactional
/// marker, minus the ignore list. Output follows symbol-set order.
pub fn select_in_scope<'a>(symbols: &'a SymbolSet, config: &ScanConfig) -> InScope<'a> {
    let markers = &config.markers;
    let mut summary = FilterSummary::default();
    let mut types = Vec::new();

    for symbol in symbols {
        let is_service = symbol.has_annotation(&markers.service);
        let is_transactional = symbol.has_annotation(&markers.transactional);
        summary.service_types += usize::from(is_service);
        summary.transactional_types += usize::from(is_transactional);

        if !(is_service && is_transactional) {
            continue;
        }
        summary.candidates += 1;

        if config.ignore_types.contains(&symbol.qualified_name) {
            summary.ignored.push(symbol.qualified_name.clone());
            continue;
        }
        types.push(symbol);
    }

    InScope { types, summary }
}
