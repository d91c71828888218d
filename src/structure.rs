//! Java declaration extraction using the tree-sitter AST.
//!
//! Produces the raw, unresolved shape of one compilation unit: package,
//! imports, and type declarations with the annotation names exactly as
//! written in source. Name resolution happens in [`crate::resolve`].

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tree_sitter::{Node, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    pub path: String,
    pub on_demand: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub annotations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDecl {
    /// Name relative to the package; nested types use `Outer.Inner`.
    pub name: String,
    pub kind: DeclKind,
    pub annotations: Vec<String>,
    pub superclass: Option<String>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompilationUnit {
    pub package: String,
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    pub fn qualify(&self, relative: &str) -> String {
        if self.package.is_empty() {
            relative.to_string()
        } else {
            format!("{}.{relative}", self.package)
        }
    }
}

pub fn parse_compilation_unit(source: &str) -> Result<CompilationUnit> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .context("Failed to load the Java grammar")?;
    let tree = parser
        .parse(source, None)
        .context("tree-sitter returned no parse tree")?;
    let root = tree.root_node();

    if let Some(bad) = first_error(root) {
        let pos = bad.start_position();
        bail!(
            "Java syntax error at line {}, column {}",
            pos.row + 1,
            pos.column + 1
        );
    }

    let bytes = source.as_bytes();
    let mut unit = CompilationUnit::default();

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                unit.package = extract_package(&child, bytes);
            }
            "import_declaration" => {
                if let Some(imp) = extract_import(&child, bytes) {
                    unit.imports.push(imp);
                }
            }
            kind if decl_kind(kind).is_some() => {
                collect_type(&child, bytes, None, &mut unit.types);
            }
            _ => {}
        }
    }

    Ok(unit)
}

fn decl_kind(kind: &str) -> Option<DeclKind> {
    match kind {
        "class_declaration" => Some(DeclKind::Class),
        "interface_declaration" => Some(DeclKind::Interface),
        "enum_declaration" => Some(DeclKind::Enum),
        "record_declaration" => Some(DeclKind::Record),
        "annotation_type_declaration" => Some(DeclKind::Annotation),
        _ => None,
    }
}

/// Statement bodies never contribute to declarations, so parse errors inside
/// them (CFR's `** GOTO lblN`, syntax newer than the grammar) are tolerated.
const BODY_KINDS: &[&str] = &["block", "constructor_body"];

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if BODY_KINDS.contains(&node.kind()) {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn extract_package(node: &Node, source: &[u8]) -> String {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "scoped_identifier" || child.kind() == "identifier" {
            return strip_whitespace(node_text(&child, source));
        }
    }
    String::new()
}

/// Static imports name members, never annotation types, and are skipped.
fn extract_import(node: &Node, source: &[u8]) -> Option<Import> {
    let mut path = String::new();
    let mut on_demand = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => return None,
            "scoped_identifier" | "identifier" => {
                path = strip_whitespace(node_text(&child, source));
            }
            "asterisk" => on_demand = true,
            _ => {}
        }
    }

    if path.is_empty() {
        None
    } else {
        Some(Import { path, on_demand })
    }
}

fn collect_type(node: &Node, source: &[u8], outer: Option<&str>, out: &mut Vec<TypeDecl>) {
    let Some(kind) = decl_kind(node.kind()) else {
        return;
    };
    let Some(simple) = node.child_by_field_name("name") else {
        return;
    };
    let simple = node_text(&simple, source);
    let name = match outer {
        Some(outer) => format!("{outer}.{simple}"),
        None => simple.to_string(),
    };

    let superclass = node
        .child_by_field_name("superclass")
        .and_then(|s| s.named_child(0))
        .map(|t| erase_type_arguments(node_text(&t, source)));

    let mut methods = Vec::new();
    let mut nested = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        collect_members(&body, source, &mut methods, &mut nested);
    }

    out.push(TypeDecl {
        name: name.clone(),
        kind,
        annotations: annotations_of(node, source),
        superclass,
        methods,
    });

    for inner in nested {
        collect_type(&inner, source, Some(&name), out);
    }
}

fn collect_members<'t>(
    body: &Node<'t>,
    source: &[u8],
    methods: &mut Vec<MethodDecl>,
    nested: &mut Vec<Node<'t>>,
) {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "method_declaration" => {
                if let Some(name) = child.child_by_field_name("name") {
                    methods.push(MethodDecl {
                        name: node_text(&name, source).to_string(),
                        annotations: annotations_of(&child, source),
                    });
                }
            }
            "enum_body_declarations" => collect_members(&child, source, methods, nested),
            kind if decl_kind(kind).is_some() => nested.push(child),
            _ => {}
        }
    }
}

fn annotations_of(node: &Node, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut inner = child.walk();
        for modifier in child.named_children(&mut inner) {
            if !matches!(modifier.kind(), "marker_annotation" | "annotation") {
                continue;
            }
            if let Some(name) = modifier.child_by_field_name("name") {
                names.push(strip_whitespace(node_text(&name, source)));
            }
        }
    }
    names
}

fn erase_type_arguments(text: &str) -> String {
    let raw = text.split('<').next().unwrap_or(text);
    strip_whitespace(raw)
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
