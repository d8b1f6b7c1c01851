//! # mdcopy
//!
//! Copy chat assistant messages as Markdown.
//!
//! Chat pages show Markdown already rendered to HTML, decorated with
//! toolbars and KaTeX markup. `mdcopy` adds a "Copy as Markdown" control
//! next to each message's native copy button and, when it is activated,
//! turns the message's HTML back into Markdown and puts it on the
//! clipboard.
//!
//! ## Features
//!
//! - ChatGPT and Gemini page dialects, with per-field selector overrides
//! - Headings, lists, quotes, fenced code with language detection, links,
//!   inline and display math
//! - Exactly one control per message, however the page re-renders
//! - Arena document model with html5ever parsing and CSS selector queries
//!
//! ## Quick Start
//!
//! ```
//! use mdcopy::dialect::{Dialect, Platform};
//! use mdcopy::markdown::html_to_markdown;
//!
//! let dialect = Dialect::builtin(Platform::ChatGpt);
//! let html = r#"<div class="markdown prose"><p>Use <code>cargo</code>:</p><ul><li>build</li><li>test</li></ul></div>"#;
//!
//! let md = html_to_markdown(html, &dialect).unwrap();
//! assert_eq!(md, "Use `cargo`:\n\n- build\n- test");
//! ```
//!
//! ## Driving a page
//!
//! A host owns the [`dom::Document`] and the clock. It hands both to a
//! [`Bootstrap`], which waits for the page to settle and then runs the
//! injection [`inject::Controller`]:
//!
//! ```
//! use std::time::Duration;
//! use mdcopy::{Bootstrap, Settings};
//! use mdcopy::dom::parse_html;
//! use mdcopy::inject::MemoryClipboard;
//! use mdcopy::telemetry::LogTelemetry;
//!
//! let mut doc = parse_html(r#"<main><article data-testid="conversation-turn-1">
//!     <div class="markdown prose"><h1>Hi</h1></div>
//!     <div class="flex flex-wrap items-center"><button aria-label="Copy"></button></div>
//! </article></main>"#);
//!
//! let mut boot = Bootstrap::new("chatgpt.com", &Settings::default(),
//!     MemoryClipboard::new(), Box::new(LogTelemetry));
//! boot.tick(&mut doc, Duration::from_secs(10));
//! boot.tick(&mut doc, Duration::from_secs(20));
//!
//! let button = boot.controller().unwrap().controls(&doc)[0];
//! boot.activate(&mut doc, button, Duration::from_secs(21));
//! assert_eq!(boot.controller().unwrap().clipboard().contents(), Some("# Hi"));
//! ```

pub mod bootstrap;
pub mod config;
pub mod dialect;
pub mod dom;
pub mod error;
pub mod inject;
pub mod markdown;
pub mod telemetry;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use bootstrap::{Bootstrap, Phase, detect_platform};
pub use config::Settings;
pub use dialect::{Dialect, Platform};
pub use error::{Error, Result};
