/* Schema index: arena of nodes addressed by their 64-bit id */

use crate::error::{CodegenError, CodegenResult};
use capn_schema::{FieldKind, Node, NodeKind};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SchemaIndex {
    nodes: Vec<Node>,
    by_id: BTreeMap<u64, usize>,
    files: Vec<usize>,
    structs: Vec<usize>,
}

impl SchemaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /* Index every node of a request, order struct fields by code order and
     * check that every group field points at a group struct node. */
    pub fn build(nodes: Vec<Node>) -> CodegenResult<Self> {
        let mut index = Self::new();
        for node in nodes {
            index.insert(node);
        }
        index.normalize_fields()?;
        index.check_groups()?;
        debug!(
            nodes = index.nodes.len(),
            files = index.files.len(),
            structs = index.structs.len(),
            "schema index built"
        );
        Ok(index)
    }

    /* A later node with the same id shadows the earlier one */
    pub fn insert(&mut self, node: Node) {
        let slot = self.nodes.len();
        match node.kind {
            NodeKind::File => self.files.push(slot),
            NodeKind::Struct(_) => self.structs.push(slot),
            _ => {}
        }
        self.by_id.insert(node.id, slot);
        self.nodes.push(node);
    }

    /* Required lookup: an unresolved id is fatal */
    pub fn lookup(&self, id: u64, context: &str) -> CodegenResult<&Node> {
        self.get(id).ok_or_else(|| CodegenError::unknown_id(id, context))
    }

    /* Best-effort lookup */
    pub fn get(&self, id: u64) -> Option<&Node> {
        self.by_id.get(&id).map(|&slot| &self.nodes[slot])
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /* File nodes in input order */
    pub fn files(&self) -> impl Iterator<Item = &Node> {
        self.files
            .iter()
            .map(|&slot| &self.nodes[slot])
            .filter(|node| self.is_current(node))
    }

    /* Struct nodes (groups included) in input order */
    pub fn structs(&self) -> impl Iterator<Item = &Node> {
        self.structs
            .iter()
            .map(|&slot| &self.nodes[slot])
            .filter(|node| self.is_current(node))
    }

    fn is_current(&self, node: &Node) -> bool {
        self.by_id
            .get(&node.id)
            .is_some_and(|&slot| std::ptr::eq(&self.nodes[slot], node))
    }

    fn normalize_fields(&mut self) -> CodegenResult<()> {
        for &slot in &self.structs {
            let node = &mut self.nodes[slot];
            let owner = node.display_name.clone();
            let Some(body) = node.as_struct_mut() else {
                continue;
            };
            let count = body.fields.len();
            if let Some(field) = body.fields.iter().find(|f| f.code_order as usize >= count) {
                return Err(CodegenError::FieldOrderOutOfRange {
                    owner,
                    field: field.name.clone(),
                    order: field.code_order,
                    count,
                });
            }
            body.fields.sort_by_key(|f| f.code_order);
        }
        Ok(())
    }

    fn check_groups(&self) -> CodegenResult<()> {
        for node in self.structs() {
            let Some(body) = node.as_struct() else {
                continue;
            };
            for field in &body.fields {
                if let FieldKind::Group(group) = &field.kind {
                    let context = format!("group '{}' of {}", field.name, node.display_name);
                    let target = self.lookup(group.type_id, &context)?;
                    if !target.is_group() {
                        return Err(CodegenError::unknown_id(
                            group.type_id,
                            format!("{} is not a group node", context),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn node(value: serde_json::Value) -> Node {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lookup_and_fields_sorted() {
        let index = SchemaIndex::build(vec![
            node(json!({"id": 1, "displayName": "a.capnp", "file": null})),
            node(json!({
                "id": 2, "displayName": "a.capnp:P", "displayNamePrefixLength": 8,
                "struct": {"dataWordCount": 1, "fields": [
                    {"name": "y", "codeOrder": 1, "slot": {"offset": 1, "type": {"int32": null}}},
                    {"name": "x", "codeOrder": 0, "slot": {"offset": 0, "type": {"int32": null}}}
                ]}
            })),
        ])
        .unwrap();

        let p = index.lookup(2, "test").unwrap();
        let names: Vec<_> = p.as_struct().unwrap().fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(index.files().count(), 1);
        assert_eq!(index.structs().count(), 1);
        assert!(index.get(99).is_none());
        assert_matches!(index.lookup(99, "test"), Err(CodegenError::UnknownIdentifier { id: 99, .. }));
    }

    #[test]
    fn test_code_order_out_of_range() {
        let err = SchemaIndex::build(vec![node(json!({
            "id": 2, "displayName": "a.capnp:P",
            "struct": {"fields": [
                {"name": "x", "codeOrder": 3, "slot": {"type": {"int32": null}}}
            ]}
        }))])
        .unwrap_err();
        assert_matches!(err, CodegenError::FieldOrderOutOfRange { order: 3, count: 1, .. });
    }

    #[test]
    fn test_unresolved_group_is_fatal() {
        let err = SchemaIndex::build(vec![node(json!({
            "id": 2, "displayName": "a.capnp:P",
            "struct": {"fields": [
                {"name": "g", "codeOrder": 0, "group": {"typeId": 77}}
            ]}
        }))])
        .unwrap_err();
        assert_matches!(err, CodegenError::UnknownIdentifier { id: 77, .. });
    }

    #[test]
    fn test_group_target_must_be_a_group() {
        let err = SchemaIndex::build(vec![
            node(json!({
                "id": 2, "displayName": "a.capnp:P",
                "struct": {"fields": [
                    {"name": "g", "codeOrder": 0, "group": {"typeId": 3}}
                ]}
            })),
            node(json!({"id": 3, "displayName": "a.capnp:Q", "struct": {}})),
        ])
        .unwrap_err();
        assert_matches!(err, CodegenError::UnknownIdentifier { id: 3, .. });

        let err = SchemaIndex::build(vec![
            node(json!({
                "id": 2, "displayName": "a.capnp:P",
                "struct": {"fields": [
                    {"name": "g", "codeOrder": 0, "group": {"typeId": 4}}
                ]}
            })),
            node(json!({"id": 4, "displayName": "a.capnp:E", "enum": {}})),
        ])
        .unwrap_err();
        assert_matches!(err, CodegenError::UnknownIdentifier { id: 4, .. });
    }
}
