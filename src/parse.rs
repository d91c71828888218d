use serde::Serialize;

const CFR_HEADER: &str = "/*\n * Decompiled with CFR";

#[derive(Debug, Clone, Serialize)]
pub struct DecompiledClass {
    pub class_name: String,
    pub content: String,
}

/// Splits CFR output for a whole jar into one source per top-level class.
pub fn parse_decompiled_output(content: &str) -> Vec<DecompiledClass> {
    let normalized = content.replace("\r\n", "\n");

    let mut starts: Vec<usize> = normalized
        .match_indices(CFR_HEADER)
        .map(|(i, _)| i)
        .collect();
    if starts.is_empty() {
        // Without header comments, each class still opens with its package line.
        starts = package_line_starts(&normalized);
    }
    if starts.len() <= 1 {
        return extract_class_name(&normalized)
            .map(|class_name| DecompiledClass {
                class_name,
                content: normalized.clone(),
            })
            .into_iter()
            .collect();
    }

    let mut results = Vec::new();
    for (idx, start) in starts.iter().enumerate() {
        let end = starts.get(idx + 1).copied().unwrap_or(normalized.len());
        let class_content = normalized[*start..end].trim();
        if class_content.is_empty() {
            continue;
        }

        if let Some(class_name) = extract_class_name(class_content) {
            results.push(DecompiledClass {
                class_name,
                content: class_content.to_string(),
            });
        }
    }

    results
}

fn package_line_starts(content: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.starts_with("package ") {
            starts.push(offset);
        }
        offset += line.len();
    }
    starts
}

pub fn extract_class_name(content: &str) -> Option<String> {
    let mut package: Option<String> = None;
    let mut type_name: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();

        if package.is_none() && line.starts_with("package ") {
            let pkg = line
                .trim_start_matches("package ")
                .trim_end_matches(';')
                .trim()
                .to_string();
            if !pkg.is_empty() {
                package = Some(pkg);
            }
        }

        if type_name.is_none()
            && !line.starts_with("import ")
            && let Some(name) = extract_type_name_from_line(line)
        {
            type_name = Some(name);
        }

        if package.is_some() && type_name.is_some() {
            break;
        }
    }

    let type_name = type_name?;
    Some(match package {
        Some(pkg) => format!("{pkg}.{type_name}"),
        None => type_name,
    })
}

fn extract_type_name_from_line(line: &str) -> Option<String> {
    let keywords = ["@interface ", "class ", "interface ", "enum ", "record "];

    for kw in keywords {
        if let Some(pos) = line.find(kw) {
            let after = &line[pos + kw.len()..];
            let token = after.split_whitespace().next()?;
            let token = token.trim_end_matches('{').trim();
            let token = token.split(['<', '(']).next().unwrap_or(token);
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decompiled_output_splits_multiple_classes() {
        let input = r#"/*
 * Decompiled with CFR 0.152.
 */
package com.acme.billing;

@Service
@Transactional
public class InvoiceService {
}
/*
 * Decompiled with CFR 0.152.
 */
package com.acme.billing;

public interface InvoicePort {
}
"#;

        let parsed = parse_decompiled_output(input);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].class_name, "com.acme.billing.InvoiceService");
        assert!(parsed[0].content.contains("@Transactional"));
        assert_eq!(parsed[1].class_name, "com.acme.billing.InvoicePort");
    }

    #[test]
    fn output_without_headers_splits_on_package_lines() {
        let input = "package a;\n\nimport x.Y;\n\npublic class One {\n}\npackage a.b;\n\npublic class Two {\n}\n";
        let parsed = parse_decompiled_output(input);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].class_name, "a.One");
        assert!(parsed[0].content.contains("import x.Y;"));
        assert_eq!(parsed[1].class_name, "a.b.Two");
        assert!(!parsed[1].content.contains("One"));
    }

    #[test]
    fn single_class_without_header_is_kept_whole() {
        let input = "package a.b;\r\npublic final class Foo<T> extends Bar {\r\n}\r\n";
        let parsed = parse_decompiled_output(input);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].class_name, "a.b.Foo");
        assert!(!parsed[0].content.contains('\r'));
    }

    #[test]
    fn extract_class_name_handles_annotation_types_and_records() {
        assert_eq!(
            extract_class_name("package a;\npublic @interface Guarded {\n}").as_deref(),
            Some("a.Guarded")
        );
        assert_eq!(
            extract_class_name("package a;\npublic record Point(int x, int y) {}").as_deref(),
            Some("a.Point")
        );
    }
}
