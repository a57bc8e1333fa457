// Forward-only string cursor used by the lexer and the component splitter

/// Scans an immutable string from front to back, stopping at delimiters.
pub struct StringScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> StringScanner<'a> {
    pub fn new(content: &'a str) -> Self {
        Self { content, pos: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.content.len()
    }

    fn remaining(&self) -> &'a str {
        &self.content[self.pos..]
    }

    /// Advance to the next occurrence of `delimiter` and return what was skipped.
    ///
    /// With `consume_delimiter` the delimiter is included in the returned slice and
    /// the cursor moves past it. When the delimiter never occurs, the rest of the
    /// input is returned and the cursor ends up at the end.
    pub fn scan_until(&mut self, delimiter: &str, consume_delimiter: bool) -> &'a str {
        if delimiter.is_empty() {
            return "";
        }

        let start = self.pos;
        match self.remaining().find(delimiter) {
            Some(offset) => {
                let found = start + offset;
                if consume_delimiter {
                    self.pos = found + delimiter.len();
                    &self.content[start..self.pos]
                } else {
                    self.pos = found;
                    &self.content[start..found]
                }
            }
            None => {
                self.pos = self.content.len();
                &self.content[start..]
            }
        }
    }

    /// Advance to the first position where any of `delimiters` starts.
    ///
    /// The matched delimiter is returned but not consumed. Candidates are tried in
    /// order at each position, so an earlier entry wins a tie.
    pub fn scan_until_any<'d>(&mut self, delimiters: &[&'d str]) -> (Option<&'d str>, &'a str) {
        if delimiters.is_empty() {
            return (None, self.remaining());
        }

        let start = self.pos;
        let rest = self.remaining();
        for (offset, _) in rest.char_indices() {
            let candidate = &rest[offset..];
            if let Some(matched) = delimiters
                .iter()
                .find(|d| !d.is_empty() && candidate.starts_with(**d))
            {
                self.pos = start + offset;
                return (Some(*matched), &self.content[start..self.pos]);
            }
        }

        self.pos = self.content.len();
        (None, &self.content[start..])
    }
}
