use nimble_types::ast::NodeId;
use nimble_types::{Category, Diagnostic, ErrorLog, SourceFile, Span};

/// Builds diagnostics against one source file and appends them to the log.
pub(crate) struct Reporter<'src> {
    source: &'src SourceFile,
    log: ErrorLog,
}

impl<'src> Reporter<'src> {
    pub(crate) fn new(source: &'src SourceFile) -> Self {
        Self {
            source,
            log: ErrorLog::new(),
        }
    }

    pub(crate) fn error(&mut self, category: Category, message: String, node: NodeId, span: Span) {
        tracing::trace!(%category, %node, %span, message = message.as_str(), "semantic error");
        let source_line = self
            .source
            .line(span.start_line)
            .unwrap_or("")
            .to_string();
        self.log.add(Diagnostic {
            file: self.source.name.clone(),
            category,
            message,
            node,
            span,
            source_line,
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.log.len()
    }

    pub(crate) fn finish(self) -> ErrorLog {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaches_file_and_source_line() {
        let source = SourceFile::new("prog.nim", "main {\n  print x\n}");
        let mut reporter = Reporter::new(&source);
        reporter.error(
            Category::UndefinedName,
            "'x' is undefined".to_string(),
            NodeId(4),
            Span::new(2, 9, 2, 10),
        );
        let log = reporter.finish();
        let d = &log.entries()[0];
        assert_eq!(d.file, "prog.nim");
        assert_eq!(d.source_line, "  print x");
        assert_eq!(d.node, NodeId(4));
    }

    #[test]
    fn out_of_range_line_is_empty() {
        let source = SourceFile::detached("mem.nim");
        let mut reporter = Reporter::new(&source);
        reporter.error(
            Category::InvalidReturn,
            "m".to_string(),
            NodeId(0),
            Span::point(9, 1),
        );
        assert_eq!(reporter.len(), 1);
        assert_eq!(reporter.finish().entries()[0].source_line, "");
    }
}
