use crate::finding::Finding;
use crate::scanner::ScanConfig;
use crate::symbol::{MethodSymbol, TypeSymbol};

/// Audits every declared method of `symbol`, in declaration order.
///
/// A type without methods yields a single [`Finding::NoMethods`]. Overloads
/// are reported individually, so two unguarded `save` methods give two
/// findings.
pub fn audit(symbol: &TypeSymbol, config: &ScanConfig) -> Vec<Finding> {
    if symbol.methods.is_empty() {
        return vec![Finding::no_methods(&symbol.qualified_name)];
    }

    symbol
        .methods
        .iter()
        .filter(|method| !is_compliant(method, config))
        .map(|method| Finding::missing_annotation(&symbol.qualified_name, &method.name))
        .collect()
}

pub fn is_compliant(method: &MethodSymbol, config: &ScanConfig) -> bool {
    if method.has_annotation(&config.markers.guard) {
        return true;
    }
    config
        .ignore_annotation
        .as_ref()
        .is_some_and(|ignore| method.has_annotation(ignore))
}
