/* Which imported files a requested file actually references */

use crate::error::{CodegenError, CodegenResult};
use crate::schema::index::SchemaIndex;
use crate::schema::names::NameTable;
use capn_schema::{Node, NodeKind, Type};
use std::collections::BTreeSet;
use tracing::debug;

/// Files (other than `file_id`) owning a node referenced by a field or
/// constant type declared in `file_id`.
pub fn used_imports(
    index: &SchemaIndex,
    names: &NameTable,
    file_id: u64,
) -> CodegenResult<BTreeSet<u64>> {
    let mut scan = ImportScan {
        index,
        names,
        used: BTreeSet::new(),
    };
    for &id in names.file_nodes(file_id) {
        let node = index.lookup(id, "declaration order")?;
        scan.node(node)?;
    }
    scan.used.remove(&file_id);
    debug!(file = format_args!("{:#x}", file_id), used = ?scan.used, "imports in use");
    Ok(scan.used)
}

struct ImportScan<'a> {
    index: &'a SchemaIndex,
    names: &'a NameTable,
    used: BTreeSet<u64>,
}

impl ImportScan<'_> {
    fn node(&mut self, node: &Node) -> CodegenResult<()> {
        match &node.kind {
            NodeKind::Struct(body) => {
                for field in &body.fields {
                    if let Some(slot) = field.as_slot() {
                        self.ty(&slot.ty)?;
                    } else if let Some(group_id) = field.group_id() {
                        let group = self.index.lookup(group_id, &node.display_name)?;
                        self.node(group)?;
                    }
                }
            }
            NodeKind::Const(c) => self.ty(&c.ty)?,
            _ => {}
        }
        Ok(())
    }

    fn ty(&mut self, ty: &Type) -> CodegenResult<()> {
        if let Some(element) = ty.element_type() {
            return self.ty(element);
        }
        let Some(id) = ty.type_id() else {
            return Ok(());
        };
        let owner = match self.names.owner(id) {
            Some(owner) => owner,
            None => self.owner_by_display_name(id)?,
        };
        self.used.insert(owner);
        Ok(())
    }

    /* Fallback: the part of the display name before ':' names the file */
    fn owner_by_display_name(&self, id: u64) -> CodegenResult<u64> {
        let node = self.index.lookup(id, "referenced type")?;
        let file_name = node.display_name.split(':').next().unwrap_or_default();
        self.index
            .files()
            .find(|f| f.display_name == file_name)
            .map(|f| f.id)
            .ok_or_else(|| CodegenError::UnknownOwningFile {
                id,
                display_name: node.display_name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn setup(nodes: serde_json::Value) -> (SchemaIndex, NameTable) {
        let index = SchemaIndex::build(serde_json::from_value(nodes).unwrap()).unwrap();
        let names = NameTable::resolve(&index).unwrap();
        (index, names)
    }

    #[test]
    fn test_imports_from_fields_groups_and_lists() {
        let (index, names) = setup(json!([
            {"id": 1, "displayName": "main.capnp", "file": null,
             "nestedNodes": [{"name": "User", "id": 10}]},
            {"id": 2, "displayName": "types.capnp", "file": null,
             "nestedNodes": [{"name": "Id", "id": 20}]},
            {"id": 3, "displayName": "unused.capnp", "file": null,
             "nestedNodes": [{"name": "Other", "id": 30}]},
            {"id": 10, "displayName": "main.capnp:User", "displayNamePrefixLength": 11,
             "struct": {"fields": [
                 {"name": "g", "codeOrder": 0, "group": {"typeId": 11}}
             ]}},
            {"id": 11, "displayName": "main.capnp:User.g", "displayNamePrefixLength": 16,
             "struct": {"isGroup": true, "fields": [
                 {"name": "ids", "codeOrder": 0,
                  "slot": {"type": {"list": {"elementType": {"struct": {"typeId": 20}}}}}}
             ]}},
            {"id": 20, "displayName": "types.capnp:Id", "displayNamePrefixLength": 12, "struct": {}},
            {"id": 30, "displayName": "unused.capnp:Other", "displayNamePrefixLength": 13, "struct": {}}
        ]));
        let used = used_imports(&index, &names, 1).unwrap();
        assert_eq!(used.into_iter().collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn test_owner_falls_back_to_display_name() {
        let (index, names) = setup(json!([
            {"id": 1, "displayName": "main.capnp", "file": null,
             "nestedNodes": [{"name": "Limit", "id": 10}]},
            {"id": 2, "displayName": "types.capnp", "file": null},
            {"id": 10, "displayName": "main.capnp:Limit", "displayNamePrefixLength": 11,
             "const": {"type": {"enum": {"typeId": 20}}, "value": {"enum": 0}}},
            {"id": 20, "displayName": "types.capnp:Kind", "displayNamePrefixLength": 12,
             "enum": {"enumerants": []}}
        ]));
        let used = used_imports(&index, &names, 1).unwrap();
        assert!(used.contains(&2));
    }

    #[test]
    fn test_unknown_owning_file() {
        let (index, names) = setup(json!([
            {"id": 1, "displayName": "main.capnp", "file": null,
             "nestedNodes": [{"name": "Limit", "id": 10}]},
            {"id": 10, "displayName": "main.capnp:Limit", "displayNamePrefixLength": 11,
             "const": {"type": {"struct": {"typeId": 20}}, "value": {"struct": null}}},
            {"id": 20, "displayName": "ghost.capnp:Thing", "displayNamePrefixLength": 12, "struct": {}}
        ]));
        assert_matches!(
            used_imports(&index, &names, 1),
            Err(CodegenError::UnknownOwningFile { id: 20, .. })
        );
    }
}
