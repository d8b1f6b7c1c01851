//! Startup: pick a dialect for the host, wait for the page, start the
//! controller.
//!
//! The page is ready in three steps. First the document must finish
//! loading. Then a main content landmark must appear; it is polled for and
//! given up on after a timeout, since some layouts never render one. Finally
//! the page gets a settle period before the controller subscribes and
//! schedules its first scan.

use std::time::Duration;

use crate::config::{Settings, Timing};
use crate::dialect::{Dialect, Platform};
use crate::dom::{Document, NodeId, ReadyState};
use crate::inject::{Activation, Clipboard, Controller};
use crate::telemetry::{NoopTelemetry, Telemetry};

/// Where the bootstrap is in its startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Unsupported host; nothing will ever happen.
    Inert,
    AwaitingLoad,
    AwaitingContent { next_poll: Duration, deadline: Duration },
    Settling { until: Duration },
    Running,
}

/// Work out the platform from the page's host name.
pub fn detect_platform(hostname: &str) -> Option<Platform> {
    Platform::detect(hostname)
}

/// True once the page shows a main content landmark.
pub fn has_content_landmark(doc: &Document) -> bool {
    doc.find_by_tag("main").is_some()
        || doc
            .descendants(doc.root())
            .any(|d| doc.attr(d, "role") == Some("main"))
        || doc.find_by_tag("message-content").is_some()
}

pub type PageController<C> = Controller<C, Box<dyn Telemetry>>;

pub struct Bootstrap<C> {
    phase: Phase,
    timing: Timing,
    telemetry_enabled: bool,
    controller: Option<PageController<C>>,
}

impl<C: Clipboard> Bootstrap<C> {
    /// Bootstrap for a page served from `hostname`.
    pub fn new(
        hostname: &str,
        settings: &Settings,
        clipboard: C,
        telemetry: Box<dyn Telemetry>,
    ) -> Self {
        let platform = detect_platform(hostname);
        if platform.is_none() {
            log::info!("no dialect for host {hostname:?}, staying idle");
        }
        Self::for_platform(platform, settings, clipboard, telemetry)
    }

    /// Bootstrap with an already known platform. `None` yields an inert
    /// bootstrap.
    pub fn for_platform(
        platform: Option<Platform>,
        settings: &Settings,
        clipboard: C,
        telemetry: Box<dyn Telemetry>,
    ) -> Self {
        let telemetry_enabled = settings.debug_options.enable_telemetry;
        let telemetry = if telemetry_enabled {
            telemetry
        } else {
            Box::new(NoopTelemetry)
        };

        let controller = platform.map(|platform| {
            let dialect = Dialect::resolve(platform, settings.overrides_for(platform));
            Controller::new(dialect, settings, clipboard, telemetry)
        });

        Self {
            phase: if controller.is_some() {
                Phase::AwaitingLoad
            } else {
                Phase::Inert
            },
            timing: settings.timing,
            telemetry_enabled,
            controller,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn platform(&self) -> Option<Platform> {
        self.controller.as_ref().map(|c| c.dialect().platform())
    }

    pub fn telemetry_enabled(&self) -> bool {
        self.telemetry_enabled
    }

    pub fn controller(&self) -> Option<&PageController<C>> {
        self.controller.as_ref()
    }

    pub fn controller_mut(&mut self) -> Option<&mut PageController<C>> {
        self.controller.as_mut()
    }

    /// Advance startup to `now`, then forward the tick to the controller
    /// once it is running.
    pub fn tick(&mut self, doc: &mut Document, now: Duration) {
        let poll = self.timing.ready_poll().max(Duration::from_millis(1));

        loop {
            match self.phase {
                Phase::Inert | Phase::Running => break,

                Phase::AwaitingLoad => {
                    if doc.ready_state() != ReadyState::Complete {
                        break;
                    }
                    self.phase = Phase::AwaitingContent {
                        next_poll: now + poll,
                        deadline: now + self.timing.ready_timeout(),
                    };
                }

                Phase::AwaitingContent {
                    next_poll,
                    deadline,
                } => {
                    let at = next_poll.min(deadline);
                    if at > now {
                        break;
                    }
                    if has_content_landmark(doc) {
                        self.phase = Phase::Settling {
                            until: at + self.timing.settle(),
                        };
                    } else if at >= deadline {
                        log::debug!("no content landmark after {deadline:?}, starting anyway");
                        self.phase = Phase::Settling {
                            until: deadline + self.timing.settle(),
                        };
                    } else {
                        self.phase = Phase::AwaitingContent {
                            next_poll: next_poll + poll,
                            deadline,
                        };
                    }
                }

                Phase::Settling { until } => {
                    if until > now {
                        break;
                    }
                    if let Some(controller) = self.controller.as_mut() {
                        controller.start(doc, until);
                        log::info!("markdown copy initialized for {}", controller.dialect().platform());
                    }
                    self.phase = Phase::Running;
                }
            }
        }

        if self.phase == Phase::Running
            && let Some(controller) = self.controller.as_mut()
        {
            controller.tick(doc, now);
        }
    }

    /// Forward a control activation. Ignored until the controller runs.
    pub fn activate(&mut self, doc: &mut Document, button: NodeId, now: Duration) -> Activation {
        match self.controller.as_mut() {
            Some(controller) if self.phase == Phase::Running => controller.activate(doc, button, now),
            _ => Activation::Ignored,
        }
    }
}
