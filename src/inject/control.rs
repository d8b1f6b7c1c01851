//! The injected "Copy as Markdown" control.
//!
//! Each control has two faces: idle and success. Both are built once up
//! front; switching faces swaps the children of a single slot element, so
//! the button itself, its attributes and its position never change.

use html5ever::ns;

use crate::dialect::Platform;
use crate::dom::{Document, NodeId};
use crate::error::Result;

/// Attribute that marks a node as one of our controls.
pub const CONTROL_MARKER: &str = "data-markdown-copy";
/// Attribute holding a container's claim token.
pub const CLAIM_ATTR: &str = "data-md-id";
pub const CONTROL_LABEL: &str = "Copy as Markdown";

const COPY_GLYPH: &str = "M12.668 10.667C12.668 9.95614 12.668 9.46258 12.6367 9.0791C12.6137 8.79732 12.5758 8.60761 12.5244 8.46387L12.4688 8.33399C12.3148 8.03193 12.0803 7.77885 11.793 7.60254L11.666 7.53125C11.508 7.45087 11.2963 7.39395 10.9209 7.36328C10.5374 7.33197 10.0439 7.33203 9.33301 7.33203H6.5C5.78896 7.33203 5.29563 7.33195 4.91211 7.36328C4.63016 7.38632 4.44065 7.42413 4.29688 7.47559L4.16699 7.53125C3.86488 7.68518 3.61186 7.9196 3.43555 8.20703L3.36524 8.33399C3.28478 8.49198 3.22795 8.70352 3.19727 9.0791C3.16595 9.46259 3.16504 9.95611 3.16504 10.667V13.5C3.16504 14.211 3.16593 14.7044 3.19727 15.0879C3.22797 15.4636 3.28473 15.675 3.36524 15.833L3.43555 15.959C3.61186 16.2466 3.86474 16.4807 4.16699 16.6348L4.29688 16.6914C4.44063 16.7428 4.63025 16.7797 4.91211 16.8027C5.29563 16.8341 5.78896 16.835 6.5 16.835H9.33301C10.0439 16.835 10.5374 16.8341 10.9209 16.8027C11.2965 16.772 11.508 16.7152 11.666 16.6348L11.793 16.5645C12.0804 16.3881 12.3148 16.1351 12.4688 15.833L12.5244 15.7031C12.5759 15.5594 12.6137 15.3698 12.6367 15.0879C12.6681 14.7044 12.668 14.211 12.668 13.5V10.667ZM13.998 12.665C14.4528 12.6634 14.8011 12.6602 15.0879 12.6367C15.4635 12.606 15.675 12.5492 15.833 12.4688L15.959 12.3975C16.2466 12.2211 16.4808 11.9682 16.6348 11.666L16.6914 11.5361C16.7428 11.3924 16.7797 11.2026 16.8027 10.9209C16.8341 10.5374 16.835 10.0439 16.835 9.33301V6.5C16.835 5.78896 16.8341 5.29563 16.8027 4.91211C16.7797 4.63025 16.7428 4.44063 16.6914 4.29688L16.6348 4.16699C16.4807 3.86474 16.2466 3.61186 15.959 3.43555L15.833 3.36524C15.675 3.28473 15.4636 3.22797 15.0879 3.19727C14.7044 3.16593 14.211 3.16504 13.5 3.16504H10.667C9.9561 3.16504 9.46259 3.16595 9.0791 3.19727C8.79739 3.22028 8.6076 3.2572 8.46387 3.30859L8.33399 3.36524C8.03176 3.51923 7.77886 3.75343 7.60254 4.04102L7.53125 4.16699C7.4508 4.32498 7.39397 4.53655 7.36328 4.91211C7.33985 5.19893 7.33562 5.54719 7.33399 6.00195H9.33301C10.022 6.00195 10.5791 6.00131 11.0293 6.03809C11.4873 6.07551 11.8937 6.15471 12.2705 6.34668L12.4883 6.46875C12.984 6.7728 13.3878 7.20854 13.6533 7.72949L13.7197 7.87207C13.8642 8.20859 13.9292 8.56974 13.9619 8.9707C13.9987 9.42092 13.998 9.97799 13.998 10.667V12.665ZM18.165 9.33301C18.165 10.022 18.1657 10.5791 18.1289 11.0293C18.0961 11.4302 18.0311 11.7914 17.8867 12.1279L17.8203 12.2705C17.5549 12.7914 17.1509 13.2272 16.6553 13.5313L16.4365 13.6533C16.0599 13.8452 15.6541 13.9245 15.1963 13.9619C14.8593 13.9895 14.4624 13.9935 13.9951 13.9951C13.9935 14.4624 13.9895 14.8593 13.9619 15.1963C13.9292 15.597 13.864 15.9576 13.7197 16.2939L13.6533 16.4365C13.3878 16.9576 12.9841 17.3941 12.4883 17.6982L12.2705 17.8203C11.8937 18.0123 11.4873 18.0915 11.0293 18.1289C10.5791 18.1657 10.022 18.165 9.33301 18.165H6.5C5.81091 18.165 5.25395 18.1657 4.80371 18.1289C4.40306 18.0962 4.04235 18.031 3.70606 17.8867L3.56348 17.8203C3.04244 17.5548 2.60585 17.151 2.30176 16.6553L2.17969 16.4365C1.98788 16.0599 1.90851 15.6541 1.87109 15.1963C1.83431 14.746 1.83496 14.1891 1.83496 13.5V10.667C1.83496 9.978 1.83432 9.42091 1.87109 8.9707C1.90851 8.5127 1.98772 8.10625 2.17969 7.72949L2.30176 7.51172C2.60586 7.0159 3.04236 6.6122 3.56348 6.34668L3.70606 6.28027C4.04237 6.136 4.40303 6.07083 4.80371 6.03809C5.14051 6.01057 5.53708 6.00551 6.00391 6.00391C6.00551 5.53708 6.01057 5.14051 6.03809 4.80371C6.0755 4.34588 6.15483 3.94012 6.34668 3.56348L6.46875 3.34473C6.77282 2.84912 7.20856 2.44514 7.72949 2.17969L7.87207 2.11328C8.20855 1.96886 8.56979 1.90385 8.9707 1.87109C9.42091 1.83432 9.978 1.83496 10.667 1.83496H13.5C14.1891 1.83496 14.746 1.83431 15.1963 1.87109C15.6541 1.90851 16.0599 1.98788 16.4365 2.17969L16.6553 2.30176C17.151 2.60585 17.5548 3.04244 17.8203 3.56348L17.8867 3.70606C18.031 4.04235 18.0962 4.40306 18.1289 4.80371C18.1657 5.25395 18.165 5.81091 18.165 6.5V9.33301Z";
const CHECK_GLYPH: &str = "M7 10l2 2 4-4";

/// Which face a control is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Idle,
    Success,
}

/// An inserted control and its feedback state.
#[derive(Debug, Clone)]
pub struct Control {
    button: NodeId,
    container: NodeId,
    token: String,
    /// Element whose children are swapped between faces.
    slot: NodeId,
    idle: Vec<NodeId>,
    success: Vec<NodeId>,
    face: Face,
    generation: u64,
}

/// True if the node is one of our controls.
pub fn is_control(doc: &Document, id: NodeId) -> bool {
    doc.attr(id, CONTROL_MARKER) == Some("true")
}

impl Control {
    /// Build a detached control styled after `anchor`.
    pub fn build(
        doc: &mut Document,
        platform: Platform,
        anchor: NodeId,
        container: NodeId,
        token: String,
    ) -> Result<Self> {
        let class = doc.attr(anchor, "class").unwrap_or_default().to_string();
        let button = doc.create_element(
            "button",
            &[
                ("class", class.as_str()),
                ("aria-label", CONTROL_LABEL),
                (CONTROL_MARKER, "true"),
                ("title", CONTROL_LABEL),
            ],
        );

        let (slot, idle, success) = match platform {
            Platform::ChatGpt => chatgpt_faces(doc, button)?,
            Platform::Gemini => gemini_faces(doc, button)?,
        };

        Ok(Self {
            button,
            container,
            token,
            slot,
            idle,
            success,
            face: Face::Idle,
            generation: 0,
        })
    }

    pub fn button(&self) -> NodeId {
        self.button
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn face(&self) -> Face {
        self.face
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Switch to the success face and start a new feedback generation.
    pub fn show_success(&mut self, doc: &mut Document) -> Result<u64> {
        self.generation += 1;
        self.show(doc, Face::Success)?;
        Ok(self.generation)
    }

    /// Return to the idle face unless a newer success has happened since
    /// `generation` was issued.
    pub fn revert(&mut self, doc: &mut Document, generation: u64) -> Result<bool> {
        if generation != self.generation || self.face == Face::Idle {
            return Ok(false);
        }
        self.show(doc, Face::Idle)?;
        Ok(true)
    }

    fn show(&mut self, doc: &mut Document, face: Face) -> Result<()> {
        if self.face == face {
            return Ok(());
        }
        doc.take_children(self.slot)?;
        let nodes = match face {
            Face::Idle => &self.idle,
            Face::Success => &self.success,
        };
        for &node in nodes {
            doc.append_child(self.slot, node)?;
        }
        self.face = face;
        Ok(())
    }
}

/// span > svg > (g > path, text "M"); the svg is the slot.
fn chatgpt_faces(doc: &mut Document, button: NodeId) -> Result<(NodeId, Vec<NodeId>, Vec<NodeId>)> {
    let span = doc.create_element(
        "span",
        &[("class", "flex items-center justify-center touch:w-10 h-8 w-8")],
    );
    let svg = doc.create_element_ns(
        ns!(svg),
        "svg",
        &[
            ("width", "20"),
            ("height", "20"),
            ("viewBox", "0 0 20 20"),
            ("fill", "currentColor"),
            ("class", "icon"),
        ],
    );
    let g = doc.create_element_ns(ns!(svg), "g", &[("opacity", "0.9")]);
    let path = doc.create_element_ns(ns!(svg), "path", &[("d", COPY_GLYPH)]);
    let badge = doc.create_element_ns(
        ns!(svg),
        "text",
        &[
            ("x", "10"),
            ("y", "15"),
            ("font-family", "Arial, sans-serif"),
            ("font-size", "7"),
            ("font-weight", "bold"),
            ("text-anchor", "middle"),
            ("fill", "currentColor"),
        ],
    );
    let m = doc.create_text("M");
    let check = doc.create_element_ns(
        ns!(svg),
        "path",
        &[
            ("d", CHECK_GLYPH),
            ("stroke", "currentColor"),
            ("stroke-width", "2"),
            ("fill", "none"),
        ],
    );

    doc.append_child(g, path)?;
    doc.append_child(badge, m)?;
    doc.append_child(svg, g)?;
    doc.append_child(svg, badge)?;
    doc.append_child(span, svg)?;
    doc.append_child(button, span)?;

    Ok((svg, vec![g, badge], vec![check]))
}

/// Material button layout with a ligature icon; the mat-icon is the slot.
fn gemini_faces(doc: &mut Document, button: NodeId) -> Result<(NodeId, Vec<NodeId>, Vec<NodeId>)> {
    doc.set_attr(button, "mat-button", "")?;
    doc.set_attr(button, "tabindex", "0")?;

    let ripple = doc.create_element(
        "span",
        &[("class", "mat-mdc-button-persistent-ripple mdc-button__ripple")],
    );
    let icon = doc.create_element(
        "mat-icon",
        &[
            ("role", "img"),
            (
                "class",
                "mat-icon notranslate embedded-copy-icon google-symbols mat-ligature-font mat-icon-no-color",
            ),
            ("aria-hidden", "true"),
        ],
    );
    let label = doc.create_element("span", &[("class", "mdc-button__label")]);
    let focus = doc.create_element("span", &[("class", "mat-focus-indicator")]);
    let touch = doc.create_element("span", &[("class", "mat-mdc-button-touch-target")]);
    let ripple2 = doc.create_element("span", &[("class", "mat-ripple mat-mdc-button-ripple")]);

    let idle = doc.create_text("description");
    let success = doc.create_text("check");
    doc.append_child(icon, idle)?;

    for child in [ripple, icon, label, focus, touch, ripple2] {
        doc.append_child(button, child)?;
    }

    Ok((icon, vec![idle], vec![success]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn anchor_doc() -> (Document, NodeId) {
        let doc = parse_html(r#"<div><button class="btn ghost" aria-label="Copy"></button></div>"#);
        let anchor = doc.find_by_tag("button").unwrap();
        (doc, anchor)
    }

    fn find_in(doc: &Document, scope: NodeId, tag: &str) -> NodeId {
        doc.descendants(scope)
            .find(|&d| doc.tag_name(d) == Some(tag))
            .unwrap()
    }

    #[test]
    fn test_common_attributes() {
        let (mut doc, anchor) = anchor_doc();
        let container = doc.parent(anchor).unwrap();
        let control =
            Control::build(&mut doc, Platform::ChatGpt, anchor, container, "t1".into()).unwrap();
        let button = control.button();

        assert_eq!(doc.attr(button, "aria-label"), Some(CONTROL_LABEL));
        assert_eq!(doc.attr(button, "title"), Some(CONTROL_LABEL));
        assert!(is_control(&doc, button));
        assert!(doc.has_class(button, "ghost"));
        assert!(!doc.is_connected(button));
        assert_eq!(control.token(), "t1");
    }

    #[test]
    fn test_chatgpt_faces_swap_svg_children() {
        let (mut doc, anchor) = anchor_doc();
        let container = doc.parent(anchor).unwrap();
        let mut control =
            Control::build(&mut doc, Platform::ChatGpt, anchor, container, "t".into()).unwrap();
        let svg = find_in(&doc, control.button(), "svg");

        assert_eq!(doc.text_content(svg), "M");
        let glyph = doc.attr(find_in(&doc, svg, "path"), "d").unwrap();
        assert_eq!(glyph.matches('M').count(), 3);
        assert!(glyph.contains("M18.165 9.33301"));

        let generation = control.show_success(&mut doc).unwrap();
        let paths: Vec<_> = doc.element_children(svg).collect();
        assert_eq!(paths.len(), 1);
        assert_eq!(doc.attr(paths[0], "d"), Some(CHECK_GLYPH));

        assert!(control.revert(&mut doc, generation).unwrap());
        assert_eq!(doc.text_content(svg), "M");
        assert_eq!(control.face(), Face::Idle);
    }

    #[test]
    fn test_gemini_icon_text() {
        let (mut doc, anchor) = anchor_doc();
        let container = doc.parent(anchor).unwrap();
        let mut control =
            Control::build(&mut doc, Platform::Gemini, anchor, container, "t".into()).unwrap();
        let icon = find_in(&doc, control.button(), "mat-icon");

        assert!(doc.has_attr(control.button(), "mat-button"));
        assert_eq!(doc.text_content(icon), "description");
        control.show_success(&mut doc).unwrap();
        assert_eq!(doc.text_content(icon), "check");
    }

    #[test]
    fn test_stale_revert_is_ignored() {
        let (mut doc, anchor) = anchor_doc();
        let container = doc.parent(anchor).unwrap();
        let mut control =
            Control::build(&mut doc, Platform::Gemini, anchor, container, "t".into()).unwrap();

        let first = control.show_success(&mut doc).unwrap();
        let second = control.show_success(&mut doc).unwrap();

        assert!(!control.revert(&mut doc, first).unwrap());
        assert_eq!(control.face(), Face::Success);
        assert!(control.revert(&mut doc, second).unwrap());
        assert_eq!(control.face(), Face::Idle);
    }

}
