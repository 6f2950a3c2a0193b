use std::collections::HashMap;

use crate::page::{Listener, ListenerOptions, Page, TargetId, TargetKind};
use crate::{Error, GuardOp, Result};

pub const LOCK_SWEEP_EVENT: &str = "custom";

pub const LOCK_SWEEP_TAGS: [&str; 5] = ["button", "input", "select", "textarea", "form"];

#[derive(Debug, Default)]
pub struct CapGuard {
    allowance: HashMap<TargetId, usize>,
    locked: bool,
}

impl CapGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_listener(
        &mut self,
        page: &mut Page,
        target: TargetId,
        event_type: &str,
        listener: &Listener,
        options: ListenerOptions,
    ) -> Result<()> {
        if self.locked {
            return Err(Error::Locked { op: GuardOp::Add });
        }
        self.check_target(page, target)?;

        let cap = {
            let slot = self.allowance.entry(target).or_insert(0);
            *slot += 1;
            *slot
        };
        page.install_gate(target, cap)?;

        // The raise above always leaves one admission free, so a guarded add
        // never trips its own gate.
        page.add_event_listener(target, event_type, listener, options)
    }

    pub fn remove_event_listener(
        &mut self,
        page: &mut Page,
        target: TargetId,
        event_type: &str,
        listener: &Listener,
        options: ListenerOptions,
    ) -> Result<()> {
        if self.locked {
            return Err(Error::Locked { op: GuardOp::Remove });
        }
        self.check_target(page, target)?;
        // The allowance is not refunded on removal: the cap records how many
        // registrations were ever granted, not how many are live.
        page.remove_event_listener(target, event_type, listener, options)
    }

    pub fn lock(&mut self, page: &mut Page) -> Result<()> {
        if self.locked {
            return Err(Error::Locked { op: GuardOp::Lock });
        }

        let mut sweep: Vec<TargetId> = page.structural_targets().to_vec();
        for tag in LOCK_SWEEP_TAGS {
            sweep.extend(page.elements_by_tag(tag));
        }
        for target in sweep {
            let opts = ListenerOptions::default();
            self.add_event_listener(page, target, LOCK_SWEEP_EVENT, &Listener::noop(), opts)?;
        }

        self.locked = true;
        Ok(())
    }

    pub fn recorded_cap(&self, target: TargetId) -> Option<usize> {
        self.allowance.get(&target).copied()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn say_hello(&self) {
        println!("Hello from liscap");
    }

    fn check_target(&self, page: &Page, target: TargetId) -> Result<()> {
        let kind = page.kind(target)?;
        match kind {
            TargetKind::Window | TargetKind::Document | TargetKind::Element(_) => Ok(()),
            other => Err(Error::InvalidTarget {
                target,
                kind: other.label().to_string(),
            }),
        }
    }
}
