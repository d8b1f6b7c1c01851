//! The injection controller.
//!
//! Containers move through `unseen → claimed → inserted`. Claiming happens
//! synchronously inside one call, so two scans can never both insert into
//! the same container: the claim token lands in the in-flight set and on
//! the container before any control is built.
//!
//! A container is considered handled when any of these hold:
//!
//! - its token is in flight
//! - the registry's control for its token is still attached to the page
//! - a control already sits inside it
//! - (Gemini) a control sits right after it
//!
//! Everything else, including a tagged container whose control the page
//! threw away, is eligible again.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::config::{Settings, Timing};
use crate::dialect::Dialect;
use crate::dom::{Document, MutationRecord, NodeId, ObserveOptions};
use crate::error::{Error, Result};
use crate::markdown::render;
use crate::telemetry::{ReportContext, Severity, Telemetry};

use super::control::{CLAIM_ATTR, Control, is_control};
use super::timers::{TimerId, Timers};
use super::Clipboard;

/// Longest HTML snapshot attached to a conversion failure report, in chars.
const SNAPSHOT_LIMIT: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    Scan,
    Release(String),
    Revert { button: NodeId, generation: u64 },
}

/// Outcome of activating a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Markdown of `length` bytes went to the clipboard.
    Copied { length: usize },
    ContentNotFound,
    ConversionFailed,
    ClipboardFailed,
    /// Not one of our controls.
    Ignored,
}

/// Element the controller subscribes to: `main`, a `role="main"` landmark,
/// the body, or the document itself, in that order of preference.
pub fn observation_root(doc: &Document) -> NodeId {
    doc.find_by_tag("main")
        .or_else(|| {
            doc.descendants(doc.root())
                .find(|&d| doc.attr(d, "role") == Some("main"))
        })
        .or_else(|| doc.body())
        .unwrap_or_else(|| doc.root())
}

pub struct Controller<C, T> {
    dialect: Dialect,
    timing: Timing,
    snapshots: bool,
    clipboard: C,
    telemetry: T,
    timers: Timers<Task>,
    debounce: Option<TimerId>,
    in_flight: HashSet<String>,
    /// Claim token → inserted control.
    registry: HashMap<String, NodeId>,
    controls: HashMap<NodeId, Control>,
    next_token: u64,
    running: bool,
}

impl<C: Clipboard, T: Telemetry> Controller<C, T> {
    pub fn new(dialect: Dialect, settings: &Settings, clipboard: C, telemetry: T) -> Self {
        Self {
            dialect,
            timing: settings.timing,
            snapshots: settings.debug_options.enable_dom_snapshot,
            clipboard,
            telemetry,
            timers: Timers::new(),
            debounce: None,
            in_flight: HashSet::new(),
            registry: HashMap::new(),
            controls: HashMap::new(),
            next_token: 0,
            running: false,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut C {
        &mut self.clipboard
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Subscribe to the page and schedule the initial scan.
    pub fn start(&mut self, doc: &mut Document, now: Duration) {
        let root = observation_root(doc);
        doc.observe(root, ObserveOptions::structural());
        self.running = true;
        log::debug!(
            "{}: observing {:?}, first scan at {:?}",
            self.dialect.platform(),
            root,
            now + self.timing.debounce()
        );
        self.schedule_scan(now);
    }

    /// Drop the subscription and every pending timer.
    pub fn stop(&mut self, doc: &mut Document) {
        doc.disconnect();
        self.timers.clear();
        self.debounce = None;
        self.running = false;
    }

    /// Handle a batch of mutation records. Any relevant addition restarts
    /// the debounce window.
    pub fn on_mutations(&mut self, doc: &Document, records: &[MutationRecord], now: Duration) {
        if !self.running {
            return;
        }
        let relevant = records
            .iter()
            .flat_map(MutationRecord::added_nodes)
            .any(|&node| self.dialect.is_relevant_addition(doc, node));
        if relevant {
            self.schedule_scan(now);
        }
    }

    /// Deliver pending mutation records, then fire every timer due by `now`.
    pub fn tick(&mut self, doc: &mut Document, now: Duration) {
        let records = doc.take_records();
        if !records.is_empty() {
            self.on_mutations(doc, &records, now);
        }
        while let Some((at, task)) = self.timers.pop_due(now) {
            self.run(doc, task, at);
        }
    }

    /// Earliest pending timer, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    fn schedule_scan(&mut self, now: Duration) {
        if let Some(pending) = self.debounce.take() {
            self.timers.cancel(pending);
        }
        self.debounce = Some(self.timers.schedule(now + self.timing.debounce(), Task::Scan));
    }

    fn run(&mut self, doc: &mut Document, task: Task, at: Duration) {
        match task {
            Task::Scan => {
                self.debounce = None;
                let inserted = self.scan(doc, at);
                log::debug!("scan at {at:?} inserted {inserted} controls");
            }
            Task::Release(token) => {
                self.in_flight.remove(&token);
            }
            Task::Revert { button, generation } => {
                let result = match self.controls.get_mut(&button) {
                    Some(control) => control.revert(doc, generation),
                    None => Ok(false),
                };
                if let Err(e) = result {
                    let ctx = self.context("feedback_revert");
                    self.telemetry.report_error(&e, &ctx);
                }
            }
        }
    }

    /// Claim every eligible container now. Failures are reported per
    /// container and never stop the scan.
    pub fn scan(&mut self, doc: &mut Document, now: Duration) -> usize {
        self.prune(doc);
        let mut inserted = 0;
        for container in self.dialect.scan(doc) {
            match self.claim(doc, container, now) {
                Ok(Some(_)) => inserted += 1,
                Ok(None) => {}
                Err(e) => {
                    let ctx = self
                        .context("inject_control")
                        .with("container", format!("{container:?}"));
                    self.telemetry.report_error(&e, &ctx);
                }
            }
        }
        inserted
    }

    /// Claim one container and insert its control. Returns the new control's
    /// button, or `None` when the container is already handled or has no
    /// anchor.
    pub fn claim(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        now: Duration,
    ) -> Result<Option<NodeId>> {
        let token = match doc.attr(container, CLAIM_ATTR) {
            Some(token) => token.to_string(),
            None => self.fresh_token(),
        };

        if self.in_flight.contains(&token) {
            return Ok(None);
        }
        if let Some(&button) = self.registry.get(&token) {
            if doc.is_connected(button) {
                return Ok(None);
            }
            log::debug!("control for {token} left the page, container is eligible again");
            self.registry.remove(&token);
            self.controls.remove(&button);
        }
        if doc.descendants(container).any(|d| is_control(doc, d)) {
            return Ok(None);
        }
        if self.dialect.has_adjacent_control(doc, container) {
            return Ok(None);
        }
        let Some(anchor) = self.dialect.anchor_in(doc, container) else {
            return Ok(None);
        };

        self.in_flight.insert(token.clone());
        self.timers
            .schedule(now + self.timing.claim_grace(), Task::Release(token.clone()));
        doc.set_attr(container, CLAIM_ATTR, &token)?;

        let control = Control::build(doc, self.dialect.platform(), anchor, container, token.clone())?;
        let button = control.button();
        let after = self.dialect.insertion_point(doc, container, anchor);
        doc.insert_after(after, button)?;

        self.registry.insert(token, button);
        self.controls.insert(button, control);
        log::debug!("inserted control {button:?} for container {container:?}");
        Ok(Some(button))
    }

    /// Forget controls that left the page, along with their containers.
    fn prune(&mut self, doc: &Document) {
        let before = self.controls.len();
        self.controls.retain(|&button, control| {
            doc.is_connected(button) && doc.is_connected(control.container())
        });
        let controls = &self.controls;
        self.registry.retain(|_, button| controls.contains_key(button));
        if self.controls.len() < before {
            log::debug!("dropped {} stale controls", before - self.controls.len());
        }
    }

    fn fresh_token(&mut self) -> String {
        let token = format!("md-{:x}", self.next_token);
        self.next_token += 1;
        token
    }

    /// Run the activation pipeline for a control: locate the content,
    /// render it, copy it, show feedback.
    pub fn activate(&mut self, doc: &mut Document, button: NodeId, now: Duration) -> Activation {
        let Some(container) = self.controls.get(&button).map(Control::container) else {
            log::debug!("ignoring activation of unknown node {button:?}");
            return Activation::Ignored;
        };

        let Some(content) = self.dialect.content_root(doc, container) else {
            let ctx = self
                .context("find_content")
                .with("containerConnected", doc.is_connected(container).to_string());
            self.telemetry.report_message(
                &Error::ContentNotFound.to_string(),
                Severity::Warning,
                &ctx,
            );
            return Activation::ContentNotFound;
        };

        let markdown = match render(doc, content, self.dialect.markup()) {
            Ok(markdown) => markdown,
            Err(e) => {
                let mut ctx = self
                    .context("markdown_conversion")
                    .with("contentType", doc.tag_name(content).unwrap_or_default());
                if self.snapshots {
                    ctx = ctx.with("domSnapshot", snapshot(doc, content));
                }
                self.telemetry.report_error(&e, &ctx);
                return Activation::ConversionFailed;
            }
        };

        if let Err(e) = self.clipboard.write_text(&markdown) {
            let ctx = self
                .context("clipboard_write")
                .with("markdownLength", markdown.len().to_string());
            self.telemetry.report_error(&Error::Clipboard(e.0), &ctx);
            return Activation::ClipboardFailed;
        }

        let shown = self
            .controls
            .get_mut(&button)
            .map(|control| control.show_success(doc));
        match shown {
            Some(Ok(generation)) => {
                self.timers.schedule(
                    now + self.timing.feedback(),
                    Task::Revert { button, generation },
                );
            }
            Some(Err(e)) => {
                let ctx = self.context("feedback");
                self.telemetry.report_error(&e, &ctx);
            }
            None => {}
        }

        Activation::Copied {
            length: markdown.len(),
        }
    }

    pub fn control(&self, button: NodeId) -> Option<&Control> {
        self.controls.get(&button)
    }

    /// Buttons of every live control, in document order.
    pub fn controls(&self, doc: &Document) -> Vec<NodeId> {
        doc.descendants(doc.root())
            .filter(|id| self.controls.contains_key(id))
            .collect()
    }

    pub fn is_in_flight(&self, token: &str) -> bool {
        self.in_flight.contains(token)
    }

    fn context(&self, operation: &'static str) -> ReportContext {
        ReportContext::new(operation, Some(self.dialect.platform()))
    }
}

fn snapshot(doc: &Document, id: NodeId) -> String {
    doc.outer_html(id).chars().take(SNAPSHOT_LIMIT).collect()
}
