//! WASM bindings for in-page Markdown conversion.
//!
//! This module exposes the transducer and platform detection to JavaScript
//! via wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::dialect::{Dialect, Platform};
use crate::markdown;

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Convert a message's HTML to Markdown.
///
/// `platform` is a platform id (`chatgpt`, `gemini`). The first element
/// matching the platform's content selector is converted, or the whole
/// fragment if none matches.
#[wasm_bindgen]
pub fn html_to_markdown(html: &str, platform: &str) -> Result<String, JsValue> {
    let platform: Platform = platform
        .parse()
        .map_err(|e: crate::Error| JsValue::from_str(&e.to_string()))?;
    let dialect = Dialect::builtin(platform);
    markdown::html_to_markdown(html, &dialect).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Platform id for a host name, or `undefined` for unsupported hosts.
#[wasm_bindgen]
pub fn detect_platform(hostname: &str) -> Option<String> {
    Platform::detect(hostname).map(|p| p.id().to_string())
}
