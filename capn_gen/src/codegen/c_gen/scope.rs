/* Emission scope of a struct body.
 *
 * `func` and `decl` are the tab depths of accessor code and of the C struct
 * declaration. `wire` and `native` are member path prefixes (ending in '.')
 * into the wire struct and the native struct. Scopes are never mutated;
 * entering a group or a case arm derives a new one. */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub func: usize,
    pub decl: usize,
    pub wire: String,
    pub native: String,
}

impl Scope {
    pub fn root() -> Self {
        Self {
            func: 1,
            decl: 1,
            wire: String::new(),
            native: String::new(),
        }
    }

    pub fn arm(&self) -> Self {
        Self {
            func: self.func + 1,
            ..self.clone()
        }
    }

    pub fn nested_decl(&self) -> Self {
        Self {
            decl: self.decl + 1,
            ..self.clone()
        }
    }

    /* Enter a group member on both sides */
    pub fn member(&self, wire: &str, native: &str) -> Self {
        Self {
            wire: format!("{}{}.", self.wire, wire),
            native: format!("{}{}.", self.native, native),
            ..self.clone()
        }
    }

    pub fn wire_path(&self, name: &str) -> String {
        format!("{}{}", self.wire, name)
    }

    pub fn native_path(&self, name: &str) -> String {
        format!("{}{}", self.native, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_derive_without_mutation() {
        let root = Scope::root();
        let group = root.member("circle", "c");
        let arm = group.arm().nested_decl();

        assert_eq!(root.wire_path("x"), "x");
        assert_eq!(group.wire_path("radius"), "circle.radius");
        assert_eq!(group.native_path("radius"), "c.radius");
        assert_eq!((arm.func, arm.decl), (2, 2));
        assert_eq!((root.func, root.decl), (1, 1));
    }
}
