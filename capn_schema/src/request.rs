use crate::node::Node;
use serde_derive::Deserialize;

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    #[serde(deserialize_with = "crate::ids::id")]
    pub id: u64,
    pub name: String,
}

#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RequestedFile {
    #[serde(deserialize_with = "crate::ids::id")]
    pub id: u64,
    pub filename: String,
    #[serde(default)]
    pub imports: Vec<Import>,
}

/* Root of the request handed to a generator plugin */
#[derive(Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CodeGeneratorRequest {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub requested_files: Vec<RequestedFile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_yaml() {
        let yaml = r#"
nodes:
  - id: 1
    displayName: demo.capnp
    file: ~
requestedFiles:
  - id: 1
    filename: demo.capnp
    imports:
      - id: "0x2"
        name: /capnp/c.capnp
"#;
        let req: CodeGeneratorRequest = serde_yml::from_str(yaml).unwrap();
        assert_eq!(req.nodes.len(), 1);
        assert_eq!(req.nodes[0].kind, crate::node::NodeKind::File);
        assert_eq!(req.requested_files[0].imports[0].id, 2);
        assert_eq!(req.requested_files[0].imports[0].name, "/capnp/c.capnp");
    }
}
