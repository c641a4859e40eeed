//! Verbose change-logging (spec.md §6.4): an optional side channel the
//! core reports through but never depends on -- silent by default,
//! wired up only when a caller supplies a sink.

use crate::id::Id;
use crate::namekind::NameKind;

/// One symbol the transformer actually changed, reported for
/// diagnostic narration: its id, the semantic role it was classified
/// under (if any), and the before/after strings.
pub struct ChangeEvent<'a> {
    pub symbol_id: Id,
    pub kind: Option<NameKind>,
    pub original: &'a str,
    pub replacement: &'a str,
}

pub trait VerboseSink {
    fn record_change(&mut self, event: ChangeEvent<'_>);
}

/// Writes one line per change to stdout -- the front end's sink when
/// `--verbose` is passed.
#[derive(Debug, Default)]
pub struct StdoutVerboseSink;

impl VerboseSink for StdoutVerboseSink {
    fn record_change(&mut self, event: ChangeEvent<'_>) {
        println!(
            "{:#x} [{}] {:?} -> {:?}",
            event.symbol_id.id(),
            kind_label(event.kind),
            event.original,
            event.replacement
        );
    }
}

fn kind_label(kind: Option<NameKind>) -> &'static str {
    match kind {
        Some(NameKind::ClassName) => "class",
        Some(NameKind::FieldName) => "field",
        Some(NameKind::SourceFileName) => "source-file",
        Some(NameKind::ThreadName) => "thread",
        Some(NameKind::ThreadGroupName) => "thread-group",
        Some(NameKind::ThreadGroupParentName) => "thread-group-parent",
        Some(NameKind::MethodNameOrSignature) => "method",
        None => "unclassified",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingSink {
        lines: Vec<String>,
    }

    impl VerboseSink for RecordingSink {
        fn record_change(&mut self, event: ChangeEvent<'_>) {
            self.lines.push(format!(
                "{}:{}->{}",
                kind_label(event.kind),
                event.original,
                event.replacement
            ));
        }
    }

    #[test]
    fn sink_receives_one_line_per_change() {
        let mut sink = RecordingSink { lines: Vec::new() };
        sink.record_change(ChangeEvent {
            symbol_id: Id::from(1),
            kind: Some(NameKind::ClassName),
            original: "Foo",
            replacement: "0000",
        });
        assert_eq!(sink.lines, vec!["class:Foo->0000".to_string()]);
    }
}
