use capn_schema::Type;
use std::borrow::Cow;

/* Identifiers a member may not use verbatim in the generated C */
const RESERVED: &[&str] = &[
    /* C++11 */
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char16_t", "char32_t", "class", "compl", "const", "constexpr",
    "const_cast", "continue", "decltype", "default", "delete", "do", "double", "dynamic_cast",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register",
    "reinterpret_cast", "return", "short", "signed", "sizeof", "static", "static_assert",
    "static_cast", "struct", "switch", "template", "this", "thread_local", "throw", "true", "try",
    "typedef", "typeid", "typename", "union", "unsigned", "using", "virtual", "void", "volatile",
    "wchar_t", "while", "xor", "xor_eq",
    /* COM */
    "interface", "module", "import",
    /* would collide with the generated _ptr/_list types */
    "ptr", "list",
    /* C11 only */
    "restrict", "_Alignas", "_Alignof", "_Atomic", "_Bool", "_Complex", "_Generic", "_Imaginary",
    "_Noreturn", "_Static_assert", "_Thread_local",
    /* accessor parameter */
    "p",
];

/* Member name with a '_' prefix when it is reserved */
pub fn field_name(name: &str) -> Cow<'_, str> {
    if RESERVED.contains(&name) {
        Cow::Owned(format!("_{}", name))
    } else {
        Cow::Borrowed(name)
    }
}

/* printf("%#x"): zero prints without the 0x prefix */
pub fn c_hex(value: u32) -> String {
    if value == 0 {
        "0".to_string()
    } else {
        format!("{:#x}", value)
    }
}

pub fn hi(bits: u64) -> u32 {
    (bits >> 32) as u32
}

pub fn lo(bits: u64) -> u32 {
    bits as u32
}

/// Expression suffix applying a scalar default with XOR. Empty when the
/// default is zero or the type carries no XOR (bool is compared instead).
pub fn xor_suffix(ty: &Type, bits: u64) -> String {
    if bits == 0 {
        return String::new();
    }
    match ty {
        Type::Int8 | Type::Int16 | Type::Int32 => format!(" ^ {}", bits as i32),
        Type::Uint8 => format!(" ^ {}u", bits as u8),
        Type::Uint16 | Type::Enum(_) => format!(" ^ {}u", bits as u16),
        Type::Uint32 => format!(" ^ {}u", bits as u32),
        Type::Float32 => format!(" ^ {}u", c_hex(bits as u32)),
        Type::Int64 => format!(
            " ^ ((int64_t)((uint64_t) {}u << 32) ^ {}u)",
            c_hex(hi(bits)),
            c_hex(lo(bits))
        ),
        Type::Uint64 | Type::Float64 => format!(
            " ^ ((uint64_t) {}u << 32) ^ {}u",
            c_hex(hi(bits)),
            c_hex(lo(bits))
        ),
        _ => String::new(),
    }
}

/* Handle passed to capn_* list/pointer calls: typed wrappers expose `.p` */
pub fn ptr_member(tname: &str, var: &str) -> String {
    if tname == "capn_ptr" {
        var.to_string()
    } else {
        format!("{}.p", var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names() {
        assert_eq!(field_name("class"), "_class");
        assert_eq!(field_name("p"), "_p");
        assert_eq!(field_name("list"), "_list");
        assert_eq!(field_name("radius"), "radius");
    }

    #[test]
    fn test_xor_suffixes() {
        assert_eq!(xor_suffix(&Type::Int32, 5), " ^ 5");
        assert_eq!(xor_suffix(&Type::Int8, (-2i64) as u64), " ^ -2");
        assert_eq!(xor_suffix(&Type::Uint8, 200), " ^ 200u");
        assert_eq!(xor_suffix(&Type::Float32, 1.0f32.to_bits() as u64), " ^ 0x3f800000u");
        assert_eq!(
            xor_suffix(&Type::Uint64, 7),
            " ^ ((uint64_t) 0u << 32) ^ 0x7u"
        );
        assert_eq!(
            xor_suffix(&Type::Int64, (-1i64) as u64),
            " ^ ((int64_t)((uint64_t) 0xffffffffu << 32) ^ 0xffffffffu)"
        );
        assert_eq!(xor_suffix(&Type::Uint16, 0), "");
    }
}
