/* Line buffer for generated C text; indentation is one tab per level */

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodeBuf {
    text: String,
}

impl CodeBuf {
    pub fn new() -> Self {
        Self::default()
    }

    /* Write one line at `indent` tabs */
    pub fn line(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.text.push('\t');
        }
        self.text.push_str(text);
        self.text.push('\n');
    }

    /* Write text verbatim */
    pub fn raw(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn append(&mut self, other: &CodeBuf) {
        self.text.push_str(&other.text);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
