//! Serializable summary of an inspected package
//!
//! Types are rendered as display strings relative to the reported package,
//! so the output is self-contained and stable across sessions.

use serde::Serialize;

use crate::inspect::Session;
use crate::package::{PackageId, PackageState, ValueKind};
use crate::types::{TypeId, TypeKind};

#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    pub path: String,
    pub name: Option<String>,
    pub state: PackageState,
    pub files: Vec<FileReport>,
    pub types: Vec<TypeReport>,
    pub values: Vec<ValueReport>,
    pub functions: Vec<FunctionReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub name: String,
    pub path: String,
    pub imports: Vec<ImportReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeReport {
    pub name: String,
    pub kind: Option<TypeKind>,
    /// False for shapes interned while evaluating expressions
    pub declared: bool,
    /// Underlying type of a declared type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlying: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueReport {
    pub kind: ValueKind,
    pub name: String,
    /// None when the type could not be determined
    #[serde(rename = "type")]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionReport {
    pub name: String,
    pub signature: Option<String>,
}

impl PackageReport {
    pub fn build(session: &Session, id: PackageId) -> Self {
        let package = session.package(id);
        let display = |ty: TypeId| session.type_name(ty, Some(id));

        let files = package
            .files
            .values()
            .map(|fid| {
                let file = session.file(*fid);
                FileReport {
                    name: file.name.clone(),
                    path: file.path.display().to_string(),
                    imports: file
                        .imports
                        .values()
                        .map(|import| ImportReport { name: import.name.clone(), path: import.path.clone() })
                        .collect(),
                }
            })
            .collect();

        let types = package
            .types
            .iter()
            .map(|(name, ty)| {
                let t = session.ty(*ty);
                let declared = t.is_named() && t.package == Some(id) && t.name == *name;
                TypeReport {
                    name: name.clone(),
                    kind: t.kind(),
                    declared,
                    underlying: if declared { t.underlying.map(display) } else { None },
                }
            })
            .collect();

        let values = package
            .values
            .values()
            .map(|vid| {
                let value = session.value(*vid);
                ValueReport { kind: value.kind, name: value.name.clone(), ty: value.ty.map(display) }
            })
            .collect();

        let functions = package
            .funcs
            .iter()
            .map(|(key, fid)| FunctionReport {
                name: key.clone(),
                signature: session.func(*fid).ty.map(display),
            })
            .collect();

        Self {
            path: package.path.clone(),
            name: package.name.clone(),
            state: package.state,
            files,
            types,
            values,
            functions,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Plain listing, one declaration per line
    pub fn to_text(&self) -> String {
        let mut out = format!("package {} ({})\n", self.name.as_deref().unwrap_or("?"), self.path);
        let slot = |ty: &Option<String>| ty.clone().unwrap_or_else(|| "?".to_string());

        for file in &self.files {
            for import in &file.imports {
                out.push_str(&format!("import {} \"{}\"\n", import.name, import.path));
            }
        }
        for ty in self.types.iter().filter(|t| t.declared) {
            out.push_str(&format!("type {} {}\n", ty.name, slot(&ty.underlying)));
        }
        for value in &self.values {
            let keyword = match value.kind {
                ValueKind::Const => "const",
                ValueKind::Var => "var",
            };
            out.push_str(&format!("{} {} {}\n", keyword, value.name, slot(&value.ty)));
        }
        for func in &self.functions {
            out.push_str(&format!("func {} {}\n", func.name, slot(&func.signature)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::frontend::source::MemorySource;
    use crate::inspect::Config;
    use pretty_assertions::assert_eq;

    fn inspected() -> (Session, PackageId) {
        let source = MemorySource::new().with_file(
            "shop/shop.go",
            r#"package shop

import "fmt"

type Price float64

const Free Price = 0

var Items map[string]Price

func Total(items ...Price) Price { return 0 }
"#,
        );
        let mut session = Session::with_source(Config::default(), Arc::new(source));
        let id = session.inspect("shop").unwrap();
        (session, id)
    }

    #[test]
    fn test_report_contents() {
        let (session, id) = inspected();
        let report = PackageReport::build(&session, id);

        assert_eq!(report.name.as_deref(), Some("shop"));
        assert_eq!(report.state, PackageState::Inspected);
        assert_eq!(report.files[0].imports[0].path, "fmt");

        let price = report.types.iter().find(|t| t.name == "Price").unwrap();
        assert!(price.declared);
        assert_eq!(price.kind, Some(TypeKind::Basic));
        assert_eq!(price.underlying.as_deref(), Some("float64"));
        assert!(report.types.iter().any(|t| t.name == "map[string]Price" && !t.declared));

        let values: Vec<(&str, Option<&str>)> =
            report.values.iter().map(|v| (v.name.as_str(), v.ty.as_deref())).collect();
        assert_eq!(values, vec![("Free", Some("Price")), ("Items", Some("map[string]Price"))]);
        assert_eq!(report.functions[0].signature.as_deref(), Some("func(...Price) Price"));
    }

    #[test]
    fn test_report_json() {
        let (session, id) = inspected();
        let json: serde_json::Value = serde_json::from_str(&PackageReport::build(&session, id).to_json()).unwrap();

        assert_eq!(json["state"], "inspected");
        assert_eq!(json["values"][0]["kind"], "CONST");
        assert_eq!(json["values"][0]["type"], "Price");
        assert_eq!(json["functions"][0]["name"], "Total");
    }

    #[test]
    fn test_report_text() {
        let (session, id) = inspected();
        let text = PackageReport::build(&session, id).to_text();

        assert!(text.starts_with("package shop (shop)\n"));
        assert!(text.contains("type Price float64\n"));
        assert!(text.contains("const Free Price\n"));
    }
}
