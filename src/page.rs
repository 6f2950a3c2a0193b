use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub(crate) usize);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    Window,
    Document,
    Element(String),
    Text(String),
}

impl TargetKind {
    pub fn label(&self) -> &str {
        match self {
            Self::Window => "window",
            Self::Document => "document",
            Self::Element(tag) => tag,
            Self::Text(_) => "text",
        }
    }
}

#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn call(&self, event: &Event) {
        (self.0)(event);
    }
}

// Removal matches the browser rule: same callback identity, same capture
// flag. Closures have no structural equality, so identity is the Rc pointer.
impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub event_type: String,
    pub target: TargetId,
}

#[derive(Debug, Clone)]
struct ListenerEntry {
    listener: Listener,
    options: ListenerOptions,
}

#[derive(Debug, Clone, Copy)]
struct Gate {
    cap: usize,
    admitted: usize,
}

#[derive(Debug, Clone, Copy)]
enum GateDecision {
    Ungated,
    Admitted { admitted: usize, cap: usize },
    Rejected { cap: usize },
}

#[derive(Debug)]
struct TargetRecord {
    kind: TargetKind,
    listeners: HashMap<String, Vec<ListenerEntry>>,
    gate: Option<Gate>,
}

#[derive(Debug)]
pub struct Page {
    targets: Vec<TargetRecord>,
    window: TargetId,
    document: TargetId,
    root: TargetId,
    head: TargetId,
    body: TargetId,
    trace: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        let mut page = Self {
            targets: Vec::new(),
            window: TargetId(0),
            document: TargetId(0),
            root: TargetId(0),
            head: TargetId(0),
            body: TargetId(0),
            trace: false,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        };
        page.window = page.push(TargetKind::Window);
        page.document = page.push(TargetKind::Document);
        page.root = page.push(TargetKind::Element("html".to_string()));
        page.head = page.push(TargetKind::Element("head".to_string()));
        page.body = page.push(TargetKind::Element("body".to_string()));
        page
    }

    fn push(&mut self, kind: TargetKind) -> TargetId {
        let id = TargetId(self.targets.len());
        self.targets.push(TargetRecord {
            kind,
            listeners: HashMap::new(),
            gate: None,
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> TargetId {
        self.push(TargetKind::Element(tag.to_ascii_lowercase()))
    }

    pub fn create_text(&mut self, text: &str) -> TargetId {
        self.push(TargetKind::Text(text.to_string()))
    }

    pub fn window(&self) -> TargetId {
        self.window
    }

    pub fn document(&self) -> TargetId {
        self.document
    }

    pub fn root(&self) -> TargetId {
        self.root
    }

    pub fn head(&self) -> TargetId {
        self.head
    }

    pub fn body(&self) -> TargetId {
        self.body
    }

    pub fn structural_targets(&self) -> [TargetId; 5] {
        [self.window, self.document, self.root, self.body, self.head]
    }

    pub fn kind(&self, target: TargetId) -> Result<&TargetKind> {
        Ok(&self.record(target)?.kind)
    }

    pub fn elements_by_tag(&self, tag: &str) -> Vec<TargetId> {
        let tag = tag.to_ascii_lowercase();
        self.targets
            .iter()
            .enumerate()
            .filter(|(_, record)| matches!(&record.kind, TargetKind::Element(t) if *t == tag))
            .map(|(idx, _)| TargetId(idx))
            .collect()
    }

    pub fn add_event_listener(
        &mut self,
        target: TargetId,
        event_type: &str,
        listener: &Listener,
        options: ListenerOptions,
    ) -> Result<()> {
        let decision = {
            let record = self.record_mut(target)?;
            match &mut record.gate {
                Some(gate) if gate.admitted >= gate.cap => GateDecision::Rejected { cap: gate.cap },
                Some(gate) => {
                    gate.admitted += 1;
                    GateDecision::Admitted {
                        admitted: gate.admitted,
                        cap: gate.cap,
                    }
                }
                None => GateDecision::Ungated,
            }
        };

        if let GateDecision::Rejected { cap } = decision {
            if self.trace {
                self.trace_line(format!("[gate] {target} rejected type={event_type} cap={cap}"));
            }
            return Err(Error::CapacityExceeded { target, cap });
        }

        let duplicate = {
            let record = self.record_mut(target)?;
            let entries = record.listeners.entry(event_type.to_string()).or_default();
            // Match browser semantics: re-adding the same callback for the
            // same type/capture pair is a no-op. The gate above still counts
            // the attempt.
            let already_present = entries.iter().any(|entry| {
                entry.listener == *listener && entry.options.capture == options.capture
            });
            if !already_present {
                entries.push(ListenerEntry {
                    listener: listener.clone(),
                    options,
                });
            }
            already_present
        };

        if self.trace {
            let gate = match decision {
                GateDecision::Admitted { admitted, cap } => format!(" gate={admitted}/{cap}"),
                _ => String::new(),
            };
            self.trace_line(format!(
                "[listener] add type={event_type} target={target}{gate} deduped={duplicate}"
            ));
        }
        Ok(())
    }

    pub fn remove_event_listener(
        &mut self,
        target: TargetId,
        event_type: &str,
        listener: &Listener,
        options: ListenerOptions,
    ) -> Result<()> {
        let removed = {
            let record = self.record_mut(target)?;
            match record.listeners.get_mut(event_type) {
                Some(entries) => {
                    let found = entries.iter().position(|entry| {
                        entry.listener == *listener && entry.options.capture == options.capture
                    });
                    match found {
                        Some(pos) => {
                            entries.remove(pos);
                            if entries.is_empty() {
                                record.listeners.remove(event_type);
                            }
                            true
                        }
                        None => false,
                    }
                }
                None => false,
            }
        };

        if self.trace {
            self.trace_line(format!(
                "[listener] remove type={event_type} target={target} removed={removed}"
            ));
        }
        Ok(())
    }

    pub fn dispatch(&mut self, target: TargetId, event_type: &str) -> Result<usize> {
        let entries = {
            let record = self.record(target)?;
            record.listeners.get(event_type).cloned().unwrap_or_default()
        };

        let event = Event {
            event_type: event_type.to_string(),
            target,
        };
        for entry in &entries {
            entry.listener.call(&event);
        }
        let fired = entries.len();

        if fired > 0 {
            // Every current entry just fired, so every once-entry drops.
            let record = self.record_mut(target)?;
            if let Some(bucket) = record.listeners.get_mut(event_type) {
                bucket.retain(|entry| !entry.options.once);
                if bucket.is_empty() {
                    record.listeners.remove(event_type);
                }
            }
        }

        if self.trace {
            self.trace_line(format!("[dispatch] type={event_type} target={target} fired={fired}"));
        }
        Ok(fired)
    }

    pub fn listener_count(&self, target: TargetId, event_type: &str) -> Result<usize> {
        let record = self.record(target)?;
        Ok(record.listeners.get(event_type).map_or(0, Vec::len))
    }

    pub fn total_listener_count(&self, target: TargetId) -> Result<usize> {
        let record = self.record(target)?;
        Ok(record.listeners.values().map(Vec::len).sum())
    }

    pub(crate) fn install_gate(&mut self, target: TargetId, cap: usize) -> Result<()> {
        {
            let record = self.record_mut(target)?;
            match &mut record.gate {
                Some(gate) => gate.cap = cap,
                None => record.gate = Some(Gate { cap, admitted: 0 }),
            }
        }
        if self.trace {
            self.trace_line(format!("[gate] {target} cap={cap}"));
        }
        Ok(())
    }

    pub fn gate_cap(&self, target: TargetId) -> Result<Option<usize>> {
        Ok(self.record(target)?.gate.map(|gate| gate.cap))
    }

    pub fn gate_admitted(&self, target: TargetId) -> Result<Option<usize>> {
        Ok(self.record(target)?.gate.map(|gate| gate.admitted))
    }

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) {
        // zero would evict every entry the moment it is logged
        self.trace_log_limit = max_entries.max(1);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    fn trace_line(&mut self, line: String) {
        if self.trace {
            if self.trace_to_stderr {
                eprintln!("{line}");
            }
            if self.trace_logs.len() >= self.trace_log_limit {
                self.trace_logs.remove(0);
            }
            self.trace_logs.push(line);
        }
    }

    fn record(&self, target: TargetId) -> Result<&TargetRecord> {
        self.targets.get(target.0).ok_or(Error::TargetNotFound(target))
    }

    fn record_mut(&mut self, target: TargetId) -> Result<&mut TargetRecord> {
        self.targets
            .get_mut(target.0)
            .ok_or(Error::TargetNotFound(target))
    }
}
