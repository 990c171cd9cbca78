/* Reading the $C annotations that steer generation */

use crate::error::{CodegenError, CodegenResult};
use capn_schema::annotations::{
    CODECGEN, DONOTINCLUDE, EXTENDEDATTRIBUTE, EXTRAHEADER, FIELDGETSET, MAPLISTCOUNT, MAPNAME,
    MAPUNIONTAG, NAMEINFIX, NAMESPACE, TYPEDEFTO,
};
use capn_schema::{Annotation, Node, Value};
use std::collections::BTreeSet;

/// Last text annotation with the given id. A matching annotation that does
/// not carry text is a schema breakage.
pub fn text_annotation<'a>(
    annotations: &'a [Annotation],
    id: u64,
    owner: &str,
) -> CodegenResult<Option<&'a str>> {
    match annotations.iter().rev().find(|a| a.id == id) {
        None => Ok(None),
        Some(a) => a.value.as_text().map(Some).ok_or_else(|| {
            CodegenError::annotation_conflict(owner, format!("annotation {:#x} is not text", id))
        }),
    }
}

pub fn mapname<'a>(annotations: &'a [Annotation], owner: &str) -> CodegenResult<Option<&'a str>> {
    text_annotation(annotations, MAPNAME, owner)
}

pub fn maplistcount<'a>(
    annotations: &'a [Annotation],
    owner: &str,
) -> CodegenResult<Option<&'a str>> {
    text_annotation(annotations, MAPLISTCOUNT, owner)
}

pub fn mapuniontag<'a>(
    annotations: &'a [Annotation],
    owner: &str,
) -> CodegenResult<Option<&'a str>> {
    text_annotation(annotations, MAPUNIONTAG, owner)
}

pub fn typedefto<'a>(annotations: &'a [Annotation], owner: &str) -> CodegenResult<Option<&'a str>> {
    text_annotation(annotations, TYPEDEFTO, owner)
}

/* Namespace prefix of a file; at most one is allowed */
pub fn file_namespace(file: &Node) -> CodegenResult<Option<String>> {
    let mut namespace = None;
    for a in file.annotations.iter().rev().filter(|a| a.id == NAMESPACE) {
        let Value::Text(text) = &a.value else {
            return Err(CodegenError::annotation_conflict(
                &file.display_name,
                "schema breakage on $C::namespace annotation",
            ));
        };
        if namespace.is_some() {
            return Err(CodegenError::annotation_conflict(
                &file.display_name,
                "$C::namespace annotation appears more than once",
            ));
        }
        namespace = Some(text.clone());
    }
    Ok(namespace)
}

/// Per-file generation switches taken from the file node's annotations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileOptions {
    pub name_infix: String,
    pub field_get_set: bool,
    pub do_not_include: BTreeSet<u64>,
    /// Extra header lines in declaration order.
    pub extra_headers: Vec<String>,
    /// Empty when absent or when the annotation carries empty text.
    pub extended_attribute: String,
    pub codec_gen: bool,
}

impl FileOptions {
    pub fn from_file(file: &Node) -> CodegenResult<Self> {
        let owner = file.display_name.as_str();
        let breakage = |name: &str| {
            CodegenError::annotation_conflict(owner, format!("schema breakage on $C::{} annotation", name))
        };
        let repeated = |name: &str| {
            CodegenError::annotation_conflict(owner, format!("$C::{} annotation appears more than once", name))
        };

        let mut options = FileOptions::default();
        let mut seen_infix = false;
        let mut seen_extattr = false;
        for a in &file.annotations {
            match a.id {
                NAMEINFIX => {
                    let text = a.value.as_text().ok_or_else(|| breakage("nameinfix"))?;
                    if seen_infix {
                        return Err(repeated("nameinfix"));
                    }
                    seen_infix = true;
                    options.name_infix = text.to_string();
                }
                FIELDGETSET => options.field_get_set = true,
                DONOTINCLUDE => {
                    let Value::Uint64(id) = a.value else {
                        return Err(breakage("donotinclude"));
                    };
                    options.do_not_include.insert(id);
                }
                EXTRAHEADER => {
                    let text = a.value.as_text().ok_or_else(|| breakage("extraheader"))?;
                    options.extra_headers.push(text.to_string());
                }
                EXTENDEDATTRIBUTE => {
                    let text = a.value.as_text().ok_or_else(|| breakage("extendedattribute"))?;
                    if seen_extattr {
                        return Err(repeated("extendedattribute"));
                    }
                    seen_extattr = true;
                    options.extended_attribute = text.to_string();
                }
                CODECGEN => options.codec_gen = true,
                _ => {}
            }
        }
        Ok(options)
    }

    /* Separator printed after the extended attribute */
    pub fn extattr_space(&self) -> &'static str {
        if self.extended_attribute.is_empty() { "" } else { " " }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn file(annotations: serde_json::Value) -> Node {
        serde_json::from_value(json!({
            "id": 1, "displayName": "demo.capnp", "file": null, "annotations": annotations
        }))
        .unwrap()
    }

    #[test]
    fn test_file_options() {
        let f = file(json!([
            {"id": format!("{:#x}", NAMEINFIX), "value": {"text": "-gen"}},
            {"id": format!("{:#x}", EXTRAHEADER), "value": {"text": "#include <a.h>"}},
            {"id": format!("{:#x}", EXTRAHEADER), "value": {"text": "#include <b.h>"}},
            {"id": format!("{:#x}", DONOTINCLUDE), "value": {"uint64": "0x10"}},
            {"id": format!("{:#x}", EXTENDEDATTRIBUTE), "value": {"text": "__attribute__((visibility(\"default\")))"}},
            {"id": format!("{:#x}", CODECGEN), "value": {"void": null}}
        ]));
        let options = FileOptions::from_file(&f).unwrap();

        assert_eq!(options.name_infix, "-gen");
        assert_eq!(options.extra_headers, ["#include <a.h>", "#include <b.h>"]);
        assert!(options.do_not_include.contains(&0x10));
        assert_eq!(options.extattr_space(), " ");
        assert!(options.codec_gen);
        assert!(!options.field_get_set);
    }

    #[test]
    fn test_empty_extended_attribute_has_no_space() {
        let f = file(json!([{"id": format!("{:#x}", EXTENDEDATTRIBUTE), "value": {"text": ""}}]));
        assert_eq!(FileOptions::from_file(&f).unwrap().extattr_space(), "");
    }

    #[test]
    fn test_conflicting_annotations() {
        let twice = file(json!([
            {"id": format!("{:#x}", NAMEINFIX), "value": {"text": "a"}},
            {"id": format!("{:#x}", NAMEINFIX), "value": {"text": "b"}}
        ]));
        assert_matches!(
            FileOptions::from_file(&twice),
            Err(CodegenError::SchemaAnnotationConflict { .. })
        );

        let not_text = file(json!([{"id": format!("{:#x}", NAMESPACE), "value": {"uint32": 3}}]));
        assert_matches!(file_namespace(&not_text), Err(CodegenError::SchemaAnnotationConflict { .. }));
    }

    #[test]
    fn test_last_text_annotation_wins() {
        let list: Vec<Annotation> = serde_json::from_value(json!([
            {"id": format!("{:#x}", MAPNAME), "value": {"text": "first"}},
            {"id": format!("{:#x}", MAPNAME), "value": {"text": "second"}}
        ]))
        .unwrap();
        assert_eq!(mapname(&list, "x").unwrap(), Some("second"));
        assert_eq!(typedefto(&list, "x").unwrap(), None);
    }
}
