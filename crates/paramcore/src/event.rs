use std::fmt;

// Ordered side-effect log for one operation. Reconciliation notices, derive
// overrides and include expansions land here; nothing reads it back to make
// decisions, it exists for reporting and tests.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scan,
    Reconcile,
    Derive,
    IncludeSource,
    Encapsulate,
    Compile,
    Substitute,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scan => "scan",
            Stage::Reconcile => "reconcile",
            Stage::Derive => "derive",
            Stage::IncludeSource => "include-source",
            Stage::Encapsulate => "encapsulate",
            Stage::Compile => "compile",
            Stage::Substitute => "substitute",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub stage: Stage,
    pub unit: String,
    pub detail: String,
}

#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> EventLog {
        EventLog::default()
    }

    pub fn push(&mut self, stage: Stage, unit: &str, detail: impl Into<String>) {
        let detail = detail.into();
        tracing::info!("[{stage}] {unit}: {detail}");
        self.events.push(Event {
            stage,
            unit: unit.to_string(),
            detail,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
