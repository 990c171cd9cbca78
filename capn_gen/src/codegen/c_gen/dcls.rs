/* Header declarations shared by every struct of a file */

use super::buffer::CodeBuf;

/// A struct (or interface) of the file in declaration order.
#[derive(Debug, Clone)]
pub struct DeclaredType {
    pub name: String,
    pub native: String,
    pub is_interface: bool,
}

pub fn emit_forward_declarations(header: &mut CodeBuf, types: &[DeclaredType]) {
    header.raw("\n");
    for t in types.iter().filter(|t| !t.is_interface) {
        header.raw(&format!("struct {};\n", t.name));
    }
    header.raw("\n");
    for t in types {
        header.raw(&format!("typedef struct {{capn_ptr p;}} {}_ptr;\n", t.name));
    }
    header.raw("\n");
    for t in types {
        header.raw(&format!("typedef struct {{capn_ptr p;}} {}_list;\n", t.name));
    }
}

/* new_/read_/write_/get_/set_ prototypes, one group per function kind */
pub fn emit_external_declarations(header: &mut CodeBuf, types: &[DeclaredType], extattr: &str) {
    let structs: Vec<&str> = types
        .iter()
        .filter(|t| !t.is_interface)
        .map(|t| t.name.as_str())
        .collect();
    let groups: [fn(&str, &str) -> String; 6] = [
        |ea, n| format!("{ea}{n}_ptr new_{n}(struct capn_segment*);\n"),
        |ea, n| format!("{ea}{n}_list new_{n}_list(struct capn_segment*, int len);\n"),
        |ea, n| format!("{ea}void read_{n}(struct {n}*, {n}_ptr);\n"),
        |ea, n| format!("{ea}void write_{n}(const struct {n}*, {n}_ptr);\n"),
        |ea, n| format!("{ea}void get_{n}(struct {n}*, {n}_list, int i);\n"),
        |ea, n| format!("{ea}void set_{n}(const struct {n}*, {n}_list, int i);\n"),
    ];
    for group in groups {
        header.raw("\n");
        for name in &structs {
            header.raw(&group(extattr, name));
        }
    }
}

pub fn emit_codec_declarations(header: &mut CodeBuf, types: &[DeclaredType]) {
    header.raw("\n");
    for t in types.iter().filter(|t| !t.is_interface) {
        let (n, native) = (t.name.as_str(), t.native.as_str());
        header.raw(&format!("void encode_{n}(struct capn_segment *,struct {n} *, {native} *);\n"));
        header.raw(&format!("void decode_{n}({native} *, struct {n} *);\n"));
        header.raw(&format!("void free_{n}({native} *);\n"));
        header.raw(&format!("void encode_{n}_list(struct capn_segment *,{n}_list *, int, {native} **);\n"));
        header.raw(&format!("void decode_{n}_list(int *, {native} ***, {n}_list);\n"));
        header.raw(&format!("void free_{n}_list(int, {native} **);\n"));
        header.raw(&format!("void encode_{n}_ptr(struct capn_segment*, {n}_ptr *, {native} *);\n"));
        header.raw(&format!("void decode_{n}_ptr({native} **, {n}_ptr);\n"));
        header.raw(&format!("void free_{n}_ptr({native} **);\n"));
        header.raw("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Vec<DeclaredType> {
        vec![DeclaredType {
            name: "Point".into(),
            native: "struct Point_".into(),
            is_interface: false,
        }]
    }

    #[test]
    fn test_forward_declarations() {
        let mut header = CodeBuf::new();
        let mut types = point();
        types.push(DeclaredType {
            name: "Service".into(),
            native: String::new(),
            is_interface: true,
        });
        emit_forward_declarations(&mut header, &types);
        assert_eq!(
            header.as_str(),
            "\nstruct Point;\n\
             \ntypedef struct {capn_ptr p;} Point_ptr;\ntypedef struct {capn_ptr p;} Service_ptr;\n\
             \ntypedef struct {capn_ptr p;} Point_list;\ntypedef struct {capn_ptr p;} Service_list;\n"
        );
    }

    #[test]
    fn test_external_declarations_carry_attribute() {
        let mut header = CodeBuf::new();
        emit_external_declarations(&mut header, &point(), "API ");
        assert!(header.as_str().starts_with("\nAPI Point_ptr new_Point(struct capn_segment*);\n"));
        assert!(header.as_str().contains("\nAPI void set_Point(const struct Point*, Point_list, int i);\n"));
    }

    #[test]
    fn test_codec_declarations_use_native_type() {
        let mut header = CodeBuf::new();
        emit_codec_declarations(&mut header, &point());
        assert!(header.as_str().contains("void decode_Point(struct Point_ *, struct Point *);\n"));
        assert!(header.as_str().contains("void free_Point_ptr(struct Point_ **);\n"));
    }
}
