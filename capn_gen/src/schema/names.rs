/* Flattened C names, per-file declaration order and node ownership */

use crate::error::{CodegenError, CodegenResult};
use crate::schema::annotations::file_namespace;
use crate::schema::index::SchemaIndex;
use capn_schema::Node;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct NameTable {
    names: BTreeMap<u64, String>,
    owners: BTreeMap<u64, u64>,
    file_order: BTreeMap<u64, Vec<u64>>,
}

impl NameTable {
    /* Walk every file of the index. A top-level nested node that is not in
     * the request is skipped; deeper unresolved ids are fatal. */
    pub fn resolve(index: &SchemaIndex) -> CodegenResult<Self> {
        let mut table = Self::default();
        for file in index.files() {
            let namespace = file_namespace(file)?.unwrap_or_default();
            let mut order = Vec::new();
            for nested in &file.nested_nodes {
                let Some(node) = index.get(nested.id) else {
                    debug!(
                        file = %file.display_name,
                        id = format_args!("{:#x}", nested.id),
                        "skipping unresolved nested node"
                    );
                    continue;
                };
                let mut walk = Walk {
                    index,
                    table: &mut table,
                    file: file.id,
                    namespace: &namespace,
                    order: &mut order,
                };
                walk.visit(node, &nested.name, "")?;
            }
            table.file_order.insert(file.id, order);
        }
        Ok(table)
    }

    pub fn name(&self, id: u64) -> CodegenResult<&str> {
        self.names
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| CodegenError::unknown_id(id, "node has no resolved name"))
    }

    /* Owning file of a node visited during resolution */
    pub fn owner(&self, id: u64) -> Option<u64> {
        self.owners.get(&id).copied()
    }

    /* Non-group nodes of a file in declaration order */
    pub fn file_nodes(&self, file_id: u64) -> &[u64] {
        self.file_order.get(&file_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

struct Walk<'a> {
    index: &'a SchemaIndex,
    table: &'a mut NameTable,
    file: u64,
    namespace: &'a str,
    order: &'a mut Vec<u64>,
}

impl Walk<'_> {
    fn visit(&mut self, node: &Node, segment: &str, prefix: &str) -> CodegenResult<()> {
        let name = format!("{}{}{}", prefix, self.namespace, segment);
        let child_prefix = format!("{}_", name);
        self.table.names.insert(node.id, name);
        self.table.owners.insert(node.id, self.file);

        if !node.is_group() {
            self.order.push(node.id);
        }

        let index = self.index;
        for nested in &node.nested_nodes {
            let context = format!("nested node '{}' of {}", nested.name, node.display_name);
            let child = index.lookup(nested.id, &context)?;
            self.visit(child, &nested.name, &child_prefix)?;
        }

        if let Some(body) = node.as_struct() {
            for field in &body.fields {
                if let Some(group_id) = field.group_id() {
                    let context = format!("group '{}' of {}", field.name, node.display_name);
                    let group = index.lookup(group_id, &context)?;
                    self.visit(group, &field.name, &child_prefix)?;
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

    fn index(nodes: serde_json::Value) -> SchemaIndex {
        SchemaIndex::build(serde_json::from_value(nodes).unwrap()).unwrap()
    }

    #[test]
    fn test_flattened_names_and_order() {
        let index = index(json!([
            {"id": 1, "displayName": "a.capnp", "file": null,
             "nestedNodes": [{"name": "Outer", "id": 2}, {"name": "Color", "id": 5}, {"name": "Gone", "id": 99}]},
            {"id": 2, "displayName": "a.capnp:Outer", "displayNamePrefixLength": 8,
             "nestedNodes": [{"name": "Inner", "id": 3}],
             "struct": {"fields": [{"name": "g", "codeOrder": 0, "group": {"typeId": 4}}]}},
            {"id": 3, "displayName": "a.capnp:Outer.Inner", "displayNamePrefixLength": 14,
             "struct": {}},
            {"id": 4, "displayName": "a.capnp:Outer.g", "displayNamePrefixLength": 14,
             "struct": {"isGroup": true}},
            {"id": 5, "displayName": "a.capnp:Color", "displayNamePrefixLength": 8,
             "enum": {"enumerants": []}}
        ]));
        let names = NameTable::resolve(&index).unwrap();

        assert_eq!(names.name(2).unwrap(), "Outer");
        assert_eq!(names.name(3).unwrap(), "Outer_Inner");
        assert_eq!(names.name(4).unwrap(), "Outer_g");
        assert_eq!(names.file_nodes(1), [2, 3, 5]);
        assert_eq!(names.owner(4), Some(1));
        assert_matches!(names.name(99), Err(CodegenError::UnknownIdentifier { .. }));
    }

    #[test]
    fn test_namespace_applies_at_every_level() {
        let index = index(json!([
            {"id": 1, "displayName": "a.capnp", "file": null,
             "annotations": [{"id": "0xf2c035025fec7c2b", "value": {"text": "ns_"}}],
             "nestedNodes": [{"name": "Outer", "id": 2}]},
            {"id": 2, "displayName": "a.capnp:Outer", "displayNamePrefixLength": 8,
             "nestedNodes": [{"name": "Inner", "id": 3}], "struct": {}},
            {"id": 3, "displayName": "a.capnp:Outer.Inner", "displayNamePrefixLength": 14,
             "struct": {}}
        ]));
        let names = NameTable::resolve(&index).unwrap();

        assert_eq!(names.name(2).unwrap(), "ns_Outer");
        assert_eq!(names.name(3).unwrap(), "ns_Outer_ns_Inner");
    }

    #[test]
    fn test_unresolved_deep_nested_node_is_fatal() {
        let index = index(json!([
            {"id": 1, "displayName": "a.capnp", "file": null,
             "nestedNodes": [{"name": "Outer", "id": 2}]},
            {"id": 2, "displayName": "a.capnp:Outer", "displayNamePrefixLength": 8,
             "nestedNodes": [{"name": "Lost", "id": 42}], "struct": {}}
        ]));
        assert_matches!(
            NameTable::resolve(&index),
            Err(CodegenError::UnknownIdentifier { id: 42, .. })
        );
    }
}
