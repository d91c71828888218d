use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// A method with neither the guard annotation nor the ignore annotation.
    MissingAnnotation { class: String, method: String },
    /// An in-scope type that declares no methods at all.
    NoMethods { class: String },
}

impl Finding {
    pub fn missing_annotation(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MissingAnnotation {
            class: class.into(),
            method: method.into(),
        }
    }

    pub fn no_methods(class: impl Into<String>) -> Self {
        Self::NoMethods {
            class: class.into(),
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            Self::MissingAnnotation { class, .. } | Self::NoMethods { class } => class,
        }
    }

    /// Empty for [`Finding::NoMethods`].
    pub fn method_name(&self) -> &str {
        match self {
            Self::MissingAnnotation { method, .. } => method,
            Self::NoMethods { .. } => "",
        }
    }

    pub fn diagnostic(&self) -> String {
        match self {
            Self::MissingAnnotation { class, method } => {
                format!("Annotation missing for {class}.{method}")
            }
            Self::NoMethods { class } => format!("No methods found for class {class}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct FindingCollector {
    findings: Vec<Finding>,
}

impl FindingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<I: IntoIterator<Item = Finding>>(&mut self, findings: I) {
        self.findings.extend(findings);
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Returns the findings together with one diagnostic line per finding.
    pub fn finish(self) -> (Vec<Finding>, Vec<String>) {
        let diagnostics = self.findings.iter().map(Finding::diagnostic).collect();
        (self.findings, diagnostics)
    }
}
