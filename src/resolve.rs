//! Annotation name resolution and closure.
//!
//! Turns raw compilation units into [`TypeSymbol`]s whose annotation sets are
//! fully qualified and closed over:
//! - meta-annotations: an annotation type declared in the loaded sources
//!   contributes the annotations it carries, transitively;
//! - inheritance: inheritable annotations on a superclass apply to its
//!   subclasses along the resolved superclass chain.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::structure::{CompilationUnit, DeclKind};
use crate::symbol::{AnnotationRef, MethodSymbol, TypeSymbol};

pub const INHERITED_META: &str = "java.lang.annotation.Inherited";

const JAVA_LANG: &[&str] = &[
    "Override",
    "Deprecated",
    "SuppressWarnings",
    "FunctionalInterface",
    "SafeVarargs",
];

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Qualified names that exist even though no loaded source declares them,
    /// used to disambiguate on-demand imports.
    pub known: Vec<String>,
    /// Annotations treated as `@Inherited` without a declaration in sources.
    pub inheritable: Vec<String>,
}

#[derive(Debug)]
struct ResolvedDecl {
    qualified_name: String,
    kind: DeclKind,
    annotations: Vec<String>,
    superclass: Option<String>,
    methods: Vec<(String, Vec<String>)>,
}

pub fn resolve(units: &[CompilationUnit], options: &ResolveOptions) -> Vec<TypeSymbol> {
    let mut known: HashSet<String> = options.known.iter().cloned().collect();
    for unit in units {
        for decl in &unit.types {
            known.insert(unit.qualify(&decl.name));
        }
    }
    let names = NameResolver { known: &known };

    let mut decls = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for unit in units {
        for decl in &unit.types {
            let qualified_name = unit.qualify(&decl.name);
            if by_name.contains_key(&qualified_name) {
                continue;
            }
            by_name.insert(qualified_name.clone(), decls.len());
            decls.push(ResolvedDecl {
                qualified_name,
                kind: decl.kind,
                annotations: names.resolve_all(unit, &decl.annotations),
                superclass: decl.superclass.as_deref().map(|s| names.resolve(unit, s)),
                methods: decl
                    .methods
                    .iter()
                    .map(|m| (m.name.clone(), names.resolve_all(unit, &m.annotations)))
                    .collect(),
            });
        }
    }

    let meta: HashMap<&str, &[String]> = decls
        .iter()
        .filter(|d| d.kind == DeclKind::Annotation)
        .map(|d| (d.qualified_name.as_str(), d.annotations.as_slice()))
        .collect();

    let mut inheritable: HashSet<&str> = options.inheritable.iter().map(String::as_str).collect();
    for (name, carried) in &meta {
        if carried.iter().any(|a| a == INHERITED_META) {
            inheritable.insert(*name);
        }
    }

    let mut symbols = Vec::new();
    for decl in decls.iter().filter(|d| d.kind != DeclKind::Annotation) {
        let mut direct: Vec<&str> = decl.annotations.iter().map(String::as_str).collect();

        let mut seen = HashSet::from([decl.qualified_name.as_str()]);
        let mut parent = decl.superclass.as_deref();
        while let Some(name) = parent {
            if !seen.insert(name) {
                break;
            }
            let Some(&idx) = by_name.get(name) else {
                break;
            };
            let sup = &decls[idx];
            direct.extend(
                sup.annotations
                    .iter()
                    .map(String::as_str)
                    .filter(|a| inheritable.contains(a)),
            );
            parent = sup.superclass.as_deref();
        }

        let mut symbol = TypeSymbol::new(decl.qualified_name.clone(), close(&meta, direct));
        for (name, annotations) in &decl.methods {
            let closed = close(&meta, annotations.iter().map(String::as_str));
            symbol.methods.push(MethodSymbol::new(name.clone(), closed));
        }
        symbols.push(symbol);
    }

    symbols
}

/// Expands `direct` with every annotation reachable through annotation
/// declarations in `meta`. Cycles (`@Documented` on itself) terminate.
fn close<'a, I>(meta: &HashMap<&str, &'a [String]>, direct: I) -> BTreeSet<AnnotationRef>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = direct.into_iter().collect();
    while let Some(name) = stack.pop() {
        if !seen.insert(name) {
            continue;
        }
        if let Some(carried) = meta.get(name) {
            stack.extend(carried.iter().map(String::as_str));
        }
    }
    seen.into_iter().map(AnnotationRef::new).collect()
}

struct NameResolver<'a> {
    known: &'a HashSet<String>,
}

impl NameResolver<'_> {
    fn resolve_all(&self, unit: &CompilationUnit, raw: &[String]) -> Vec<String> {
        raw.iter().map(|r| self.resolve(unit, r)).collect()
    }

    fn resolve(&self, unit: &CompilationUnit, raw: &str) -> String {
        let (head, rest) = match raw.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (raw, None),
        };

        if let Some(rest) = rest {
            // `Outer.Inner` through an import or the unit's package, else already qualified.
            if let Some(imported) = self.single_import(unit, head) {
                return format!("{imported}.{rest}");
            }
            let local = unit.qualify(raw);
            if self.known.contains(&local) {
                return local;
            }
            return raw.to_string();
        }

        if let Some(imported) = self.single_import(unit, raw) {
            return imported.to_string();
        }

        let nested_suffix = format!(".{raw}");
        if let Some(decl) = unit
            .types
            .iter()
            .find(|t| t.name == raw || t.name.ends_with(&nested_suffix))
        {
            return unit.qualify(&decl.name);
        }

        let same_package = unit.qualify(raw);
        if self.known.contains(&same_package) {
            return same_package;
        }

        for import in unit.imports.iter().filter(|i| i.on_demand) {
            let candidate = format!("{}.{raw}", import.path);
            if self.known.contains(&candidate) {
                return candidate;
            }
        }

        if JAVA_LANG.contains(&raw) {
            return format!("java.lang.{raw}");
        }

        same_package
    }

    fn single_import<'u>(&self, unit: &'u CompilationUnit, simple: &str) -> Option<&'u str> {
        unit.imports
            .iter()
            .filter(|i| !i.on_demand)
            .map(|i| i.path.as_str())
            .find(|path| path.rsplit('.').next() == Some(simple))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{GUARD_ANNOTATION, SERVICE_MARKER, TRANSACTIONAL_MARKER};
    use crate::structure::parse_compilation_unit;

    fn options() -> ResolveOptions {
        ResolveOptions {
            known: vec![
                SERVICE_MARKER.to_string(),
                TRANSACTIONAL_MARKER.to_string(),
                GUARD_ANNOTATION.to_string(),
            ],
            inheritable: vec![TRANSACTIONAL_MARKER.to_string()],
        }
    }

    fn units(sources: &[&str]) -> Vec<CompilationUnit> {
        sources
            .iter()
            .map(|s| parse_compilation_unit(s).unwrap())
            .collect()
    }

    fn annotation_names(symbol: &TypeSymbol) -> Vec<&str> {
        symbol.annotations.iter().map(|a| a.qualified_name()).collect()
    }

    #[test]
    fn resolves_single_type_and_on_demand_imports() {
        let units = units(&[r#"
package com.acme;

import org.springframework.stereotype.Service;
import org.springframework.transaction.annotation.*;
import org.springframework.security.access.prepost.*;

@Service
@Transactional
public class Billing {
    @PreAuthorize("isAuthenticated()")
    public void pay() {}
    @Override
    public String toString() { return ""; }
}
"#]);
        let symbols = resolve(&units, &options());
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].qualified_name, "com.acme.Billing");
        assert_eq!(
            annotation_names(&symbols[0]),
            vec![SERVICE_MARKER, TRANSACTIONAL_MARKER]
        );
        assert!(symbols[0].methods[0].has_annotation(&AnnotationRef::new(GUARD_ANNOTATION)));
        assert!(symbols[0].methods[1].has_annotation(&AnnotationRef::new("java.lang.Override")));
    }

    #[test]
    fn meta_annotations_close_transitively_and_stay_out_of_output() {
        let units = units(&[
            r#"
package com.acme.stereo;

import org.springframework.stereotype.Service;
import org.springframework.transaction.annotation.Transactional;

@Service
@Transactional
@Documented
public @interface TxService {}
"#,
            r#"
package com.acme.stereo;

@TxService
public @interface BillingService {}
"#,
            r#"
package com.acme.billing;

import com.acme.stereo.BillingService;

@BillingService
public class Invoices {
    public void list() {}
}
"#,
        ]);
        let symbols = resolve(&units, &options());
        assert_eq!(symbols.len(), 1);
        let names = annotation_names(&symbols[0]);
        assert!(names.contains(&SERVICE_MARKER));
        assert!(names.contains(&TRANSACTIONAL_MARKER));
        assert!(names.contains(&"com.acme.stereo.TxService"));
    }

    #[test]
    fn method_level_meta_annotation_counts_as_guard() {
        let units = units(&[
            r#"
package a;

import org.springframework.security.access.prepost.PreAuthorize;

@PreAuthorize("hasRole('ADMIN')")
public @interface AdminOnly {}
"#,
            r#"
package a;

public class Svc {
    @AdminOnly
    public void purge() {}
}
"#,
        ]);
        let symbols = resolve(&units, &options());
        assert!(symbols[0].methods[0].has_annotation(&AnnotationRef::new(GUARD_ANNOTATION)));
    }

    #[test]
    fn inheritable_annotations_flow_down_the_superclass_chain() {
        let units = units(&[
            r#"
package a;

import org.springframework.transaction.annotation.Transactional;
import org.springframework.stereotype.Service;

@Transactional
@Service
public abstract class Base {}
"#,
            r#"
package a;

public abstract class Middle extends Base {}
"#,
            r#"
package a;

import org.springframework.stereotype.Service;

@Service
public class Leaf extends Middle<String> {
    public void run() {}
}
"#,
        ]);
        let symbols = resolve(&units, &options());
        let leaf = symbols.iter().find(|s| s.qualified_name == "a.Leaf").unwrap();
        assert!(leaf.has_annotation(&AnnotationRef::new(TRANSACTIONAL_MARKER)));

        // Service is not inheritable.
        let middle = symbols.iter().find(|s| s.qualified_name == "a.Middle").unwrap();
        assert!(!middle.has_annotation(&AnnotationRef::new(SERVICE_MARKER)));
        assert!(middle.has_annotation(&AnnotationRef::new(TRANSACTIONAL_MARKER)));
    }

    #[test]
    fn source_declared_inherited_annotation_is_honored() {
        let units = units(&[
            r#"
package a;

@java.lang.annotation.Inherited
public @interface Audited {}
"#,
            r#"
package a;

@Audited
public class Base {}
"#,
            r#"
package a;

public class Child extends Base {}
"#,
        ]);
        let symbols = resolve(&units, &options());
        let child = symbols.iter().find(|s| s.qualified_name == "a.Child").unwrap();
        assert!(child.has_annotation(&AnnotationRef::new("a.Audited")));
    }

    #[test]
    fn cyclic_hierarchies_and_meta_annotations_terminate() {
        let units = units(&[r#"
package a;

@B
@interface A {}

@A
@interface B {}

@A
class X extends Y {}

class Y extends X {}
"#]);
        let symbols = resolve(&units, &ResolveOptions::default());
        let x = symbols.iter().find(|s| s.qualified_name == "a.X").unwrap();
        assert_eq!(annotation_names(x), vec!["a.A", "a.B"]);
    }

    #[test]
    fn unknown_simple_names_fall_back_to_the_unit_package() {
        let units = units(&["package a; @Custom class X { @Other void m() {} }"]);
        let symbols = resolve(&units, &ResolveOptions::default());
        assert_eq!(annotation_names(&symbols[0]), vec!["a.Custom"]);
        assert!(symbols[0].methods[0].has_annotation(&AnnotationRef::new("a.Other")));
    }

    #[test]
    fn duplicate_declarations_keep_the_first() {
        let units = units(&[
            "package a; @First class Dup { void one() {} }",
            "package a; @Second class Dup { void two() {} }",
        ]);
        let symbols = resolve(&units, &ResolveOptions::default());
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].methods[0].name, "one");
    }
}
