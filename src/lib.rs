//! # srv-ann-check
//!
//! Access-control compliance scanner for Spring service layers: every method
//! of a class annotated with both `@Service` and `@Transactional` must carry
//! `@PreAuthorize` (or a configured alternate annotation).
//!
//! ## Architecture
//!
//! Scanner core, pure and log-free:
//! - **symbol**: Type, method and annotation symbols; duplicate-collapsing symbol set
//! - **filter**: Service ∩ transactional selection minus the ignore list
//! - **audit**: Per-method guard check
//! - **finding**: Findings and their diagnostic lines
//! - **scanner**: Scan configuration and orchestration
//! - **error**: Configuration and scan failures
//!
//! Artifact loading:
//! - **discover**: Source, class and jar discovery under input roots
//! - **archive**: Jar inspection via memory-mapped zip reading
//! - **cfr**: CFR decompiler integration for compiled classes
//! - **parse**: Splitting CFR output into per-class sources
//! - **structure**: Java declaration extraction using tree-sitter AST parsing
//! - **resolve**: Annotation name resolution, meta-annotation and inheritance closure
//! - **loader**: Parallel loading of all inputs into a scoped symbol table
//!
//! Around the scan:
//! - **report**: JSON and HTML reports
//! - **config**: Config file and CLI precedence, CFR location
//! - **cli**: Command line definition

pub mod archive;
pub mod audit;
pub mod cfr;
pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod filter;
pub mod finding;
pub mod loader;
pub mod parse;
pub mod report;
pub mod resolve;
pub mod scanner;
pub mod structure;
pub mod symbol;

pub use error::{Error, Result};
pub use finding::Finding;
pub use scanner::{ScanConfig, ScanResult, scan, scan_symbols};
pub use symbol::{AnnotationRef, MethodSymbol, SymbolSet, TypeSymbol};
