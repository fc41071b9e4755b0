//! CodePrinter - ordered, append-only sink for emitted lines

/// Collects emitted lines with the current indentation applied
#[derive(Debug)]
pub struct CodePrinter {
    lines: Vec<String>,
    level: usize,
    indent: String,
}

impl CodePrinter {
    pub fn new() -> Self {
        Self::with_indent("\t", 0)
    }

    /// Printer whose lines sit `level` indents deep
    pub fn with_indent(indent: &str, level: usize) -> Self {
        Self {
            lines: Vec::new(),
            level,
            indent: indent.to_string(),
        }
    }

    /// Emit a line at the current level
    pub fn output(&mut self, line: impl AsRef<str>) {
        let mut rendered = self.indent.repeat(self.level);
        rendered.push_str(line.as_ref());
        self.lines.push(rendered);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drop everything emitted after the first `len` lines
    pub fn truncate(&mut self, len: usize) {
        self.lines.truncate(len);
    }
}

impl Default for CodePrinter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_at_level() {
        let mut printer = CodePrinter::with_indent("  ", 2);
        printer.output("a = 1;");
        printer.output("b = 2;");
        assert_eq!(printer.lines(), ["    a = 1;", "    b = 2;"]);

        let mut flat = CodePrinter::new();
        flat.output("a = 1;");
        assert_eq!(flat.lines(), ["a = 1;"]);
    }

    #[test]
    fn test_truncate_rolls_back() {
        let mut printer = CodePrinter::new();
        printer.output("a = 1;");
        let mark = printer.len();
        printer.output("b = 2;");
        printer.output("c = 3;");
        printer.truncate(mark);
        assert_eq!(printer.lines(), ["a = 1;"]);
    }
}
