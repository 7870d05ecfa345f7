//! Inline editors on bound elements
//!
//! The hub turns bindings that asked for an editor into editors and hands
//! out one [`EditorListener`] per element. Listeners share a
//! [`RevocationToken`]; unregistering revokes it, so listeners still held by
//! an adapter turn into no-ops instead of acting on stale elements.

use crate::engine::{ChangeOutcome, EngineState};
use crate::error::{EngineError, EngineResult};
use docvar_expand::{
    apply_editor_state, Document, NodeId, ANY_EDITOR_CLASS, CHECKBOX_EDITOR_CLASS,
    DROPDOWN_EDITOR_CLASS, EDITOR_REQUEST_CLASS, TEXTBOX_EDITOR_CLASS, VALIDATION_CLASSES,
};
use docvar_registry::PlaceholderKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const ICONS_CLASS: &str = "inline-editor-icons";
const SIMPLE_CLASS: &str = "inline-editor-simple";
const EDITOR_ATTRIBUTES: [&str; 3] = ["title", "tabindex", "contenteditable"];

/// Editor flavour, following the placeholder kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// Editable text
    Textbox,
    /// Click to toggle
    Checkbox,
    /// Click or scroll through the options
    Dropdown,
}

impl EditorKind {
    fn of(kind: &PlaceholderKind) -> Self {
        match kind {
            PlaceholderKind::Textbox(_) => Self::Textbox,
            PlaceholderKind::Checkbox(_) => Self::Checkbox,
            PlaceholderKind::Dropdown(_) => Self::Dropdown,
        }
    }

    /// Class marking an active editor of this kind
    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            Self::Textbox => TEXTBOX_EDITOR_CLASS,
            Self::Checkbox => CHECKBOX_EDITOR_CLASS,
            Self::Dropdown => DROPDOWN_EDITOR_CLASS,
        }
    }
}

/// User interaction delivered by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// Text confirmed with Enter
    Confirm(String),
    /// Focus left a textbox editor
    FocusLost(String),
    /// Click on a checkbox editor
    Toggle,
    /// Step through dropdown options, negative steps go backwards
    Step(isize),
}

/// Shared flag that disables a generation of listeners
#[derive(Debug, Clone, Default)]
pub struct RevocationToken(Arc<AtomicBool>);

impl RevocationToken {
    /// Fresh, active token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable every listener holding this token
    pub fn revoke(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether [`RevocationToken::revoke`] was called
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Event handler attached to one editor element
#[derive(Debug, Clone)]
pub struct EditorListener {
    placeholder: String,
    element: NodeId,
    kind: EditorKind,
    token: RevocationToken,
}

impl EditorListener {
    /// Placeholder edited through this element
    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Editor element
    #[must_use]
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Editor flavour
    #[must_use]
    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    /// Whether the hub still owns this listener
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.token.is_revoked()
    }

    /// Run the change cycle for an event
    ///
    /// Returns `Ok(None)` when nothing changed: the listener was revoked, the
    /// event does not fit the editor, or the text is the current value.
    ///
    /// # Errors
    /// Whatever the matching [`EngineState`] change operation returns
    pub fn dispatch(
        &self,
        engine: &mut EngineState,
        event: EditorEvent,
    ) -> EngineResult<Option<ChangeOutcome>> {
        if !self.is_active() {
            debug!("Ignoring event for revoked editor of {}", self.placeholder);
            return Ok(None);
        }
        match (self.kind, event) {
            (EditorKind::Textbox, EditorEvent::Confirm(text)) => self.confirm_text(engine, &text),
            (EditorKind::Textbox, EditorEvent::FocusLost(text)) => {
                if engine.settings().apply_change_on_focus_change {
                    self.confirm_text(engine, &text)
                } else {
                    Ok(None)
                }
            }
            (EditorKind::Checkbox, EditorEvent::Toggle) => {
                engine.toggle_checked(&self.placeholder).map(Some)
            }
            (EditorKind::Dropdown, EditorEvent::Step(delta)) => {
                engine.cycle_index(&self.placeholder, delta).map(Some)
            }
            (kind, event) => {
                debug!("{kind:?} editor of {} ignores {event:?}", self.placeholder);
                Ok(None)
            }
        }
    }

    fn confirm_text(
        &self,
        engine: &mut EngineState,
        text: &str,
    ) -> EngineResult<Option<ChangeOutcome>> {
        let unchanged = engine
            .registry()
            .get(&self.placeholder)
            .is_some_and(|p| p.current_value == text);
        if unchanged {
            debug!("Value for placeholder {} was not changed", self.placeholder);
            return Ok(None);
        }
        engine.set_text(&self.placeholder, text).map(Some)
    }
}

/// Owner of the inline editors of one page
#[derive(Debug, Default)]
pub struct InteractionHub {
    token: RevocationToken,
    listeners: Vec<EditorListener>,
}

impl InteractionHub {
    /// Hub without editors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Listeners of the current generation
    #[must_use]
    pub fn listeners(&self) -> &[EditorListener] {
        &self.listeners
    }

    /// Listener attached to `element`
    #[must_use]
    pub fn listener_for(&self, element: NodeId) -> Option<&EditorListener> {
        self.listeners.iter().find(|l| l.element == element)
    }

    /// Turn requested bindings into editors
    ///
    /// Does nothing when inline editors are switched off. Read-only
    /// placeholders never get an editor. Returns the number of new editors.
    ///
    /// # Errors
    /// [`EngineError::NoPage`] without an attached page
    pub fn register_inline_editors(&mut self, engine: &mut EngineState) -> EngineResult<usize> {
        let enabled = engine.settings().inline_editors;
        let icons = engine.settings().inline_editor_icons;
        let (page, registry) = engine.page_parts().ok_or(EngineError::NoPage)?;
        set_editor_style(&mut page.document, icons);
        if !enabled {
            info!("Inline editors are disabled");
            return Ok(0);
        }

        let requested: Vec<(String, NodeId)> = page
            .bindings
            .iter()
            .filter(|&(_, id)| page.document.has_class(id, EDITOR_REQUEST_CLASS))
            .filter(|&(_, id)| self.listener_for(id).is_none())
            .map(|(name, id)| (name.to_string(), id))
            .collect();

        let mut registered = 0;
        for (name, element) in requested {
            let Some(placeholder) = registry.get(&name) else {
                warn!("Unknown placeholder referenced in inline editor: '{name}'");
                continue;
            };
            if placeholder.read_only {
                debug!("{name} is read-only, no inline editor");
                continue;
            }
            let kind = EditorKind::of(&placeholder.kind);
            let doc = &mut page.document;
            doc.add_class(element, ANY_EDITOR_CLASS);
            doc.add_class(element, kind.class());
            doc.set_attribute(element, "tabindex", "0");
            if kind == EditorKind::Textbox {
                doc.set_attribute(element, "contenteditable", "true");
            }
            apply_editor_state(doc, element, placeholder);
            self.listeners.push(EditorListener {
                placeholder: name,
                element,
                kind,
                token: self.token.clone(),
            });
            registered += 1;
        }
        info!("Registered {registered} inline editor(s)");
        Ok(registered)
    }

    /// Remove every editor and revoke the listeners handed out so far
    ///
    /// Returns the number of revoked listeners.
    pub fn unregister_inline_editors(&mut self, engine: &mut EngineState) -> usize {
        self.token.revoke();
        self.token = RevocationToken::new();
        let revoked: Vec<EditorListener> = self.listeners.drain(..).collect();
        if let Some((page, _)) = engine.page_parts() {
            for listener in &revoked {
                strip_editor(&mut page.document, listener.element);
            }
        }
        info!("Unregistered {} inline editor(s)", revoked.len());
        revoked.len()
    }
}

fn strip_editor(doc: &mut Document, element: NodeId) {
    for class in [
        ANY_EDITOR_CLASS,
        TEXTBOX_EDITOR_CLASS,
        CHECKBOX_EDITOR_CLASS,
        DROPDOWN_EDITOR_CLASS,
    ]
    .into_iter()
    .chain(VALIDATION_CLASSES)
    {
        doc.remove_class(element, class);
    }
    for attribute in EDITOR_ATTRIBUTES {
        doc.remove_attribute(element, attribute);
    }
}

/// Mark the body with the editor style
fn set_editor_style(doc: &mut Document, icons: bool) {
    let root = doc.root();
    let Some(&body) = doc
        .find_elements(root, |d, n| d.tag(n) == Some("body"))
        .first()
    else {
        return;
    };
    let (add, remove) = if icons {
        (ICONS_CLASS, SIMPLE_CLASS)
    } else {
        (SIMPLE_CLASS, ICONS_CLASS)
    };
    doc.add_class(body, add);
    doc.remove_class(body, remove);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Page;
    use docvar_registry::{Capabilities, Descriptor};
    use docvar_state::MemoryStorage;
    use docvar_test_utils::SAMPLE_DESCRIPTOR;

    const PAGE: &str =
        "<html><body><p>eHOSTe eTLSe ePORTe eURLe dHOSTd</p></body></html>";

    fn engine_with_page() -> EngineState {
        let descriptor = Descriptor::from_yaml_str(SAMPLE_DESCRIPTOR).unwrap();
        let mut engine =
            EngineState::new(&descriptor, Box::new(MemoryStorage::new()), &Capabilities::new());
        engine.attach_page(Page::new(Document::parse(PAGE))).unwrap();
        engine
    }

    fn listener<'a>(hub: &'a InteractionHub, name: &str) -> &'a EditorListener {
        hub.listeners().iter().find(|l| l.placeholder() == name).unwrap()
    }

    #[test]
    fn editors_skip_read_only_and_plain_bindings() {
        let mut engine = engine_with_page();
        let mut hub = InteractionHub::new();
        assert_eq!(hub.register_inline_editors(&mut engine).unwrap(), 3);
        assert_eq!(hub.register_inline_editors(&mut engine).unwrap(), 0);

        let html = engine.page().unwrap().to_html();
        assert!(html.contains(r#"<body class="inline-editor-icons">"#));
        assert!(html.contains("placeholder-value-editable validation-ok"));
        assert!(html.contains("placeholder-value-checkbox checked"));
        assert!(html.contains("placeholder-value-dropdown"));
        assert_eq!(listener(&hub, "HOST").kind(), EditorKind::Textbox);
    }

    #[test]
    fn events_run_the_change_cycle() {
        let mut engine = engine_with_page();
        let mut hub = InteractionHub::new();
        hub.register_inline_editors(&mut engine).unwrap();

        let host = listener(&hub, "HOST").clone();
        let outcome = host
            .dispatch(&mut engine, EditorEvent::Confirm("b.example".to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(outcome.affected, vec!["HOST", "URL"]);
        assert_eq!(outcome.refreshed, 3);
        assert!(host
            .dispatch(&mut engine, EditorEvent::FocusLost("b.example".to_string()))
            .unwrap()
            .is_none());

        let tls = listener(&hub, "TLS").clone();
        tls.dispatch(&mut engine, EditorEvent::Toggle).unwrap().unwrap();
        assert_eq!(engine.expanded_value("URL").unwrap(), "http://b.example:443/");
        assert!(engine.page().unwrap().to_html().contains("placeholder-value-checkbox unchecked"));

        assert!(tls.dispatch(&mut engine, EditorEvent::Step(1)).unwrap().is_none());
    }

    #[test]
    fn unregister_revokes_held_listeners() {
        let mut engine = engine_with_page();
        let mut hub = InteractionHub::new();
        hub.register_inline_editors(&mut engine).unwrap();
        let port = listener(&hub, "PORT").clone();

        assert_eq!(hub.unregister_inline_editors(&mut engine), 3);
        assert!(!port.is_active());
        assert!(port.dispatch(&mut engine, EditorEvent::Step(1)).unwrap().is_none());
        assert_eq!(engine.expanded_value("PORT").unwrap(), "443");

        let html = engine.page().unwrap().to_html();
        assert!(!html.contains("placeholder-value-any"));
        assert!(!html.contains("tabindex"));
        assert!(html.contains("inline-editor-requested"));

        assert_eq!(hub.register_inline_editors(&mut engine).unwrap(), 3);
        assert!(listener(&hub, "PORT").is_active());
    }

    #[test]
    fn disabled_editors_and_missing_page() {
        let descriptor = Descriptor::from_yaml_str(SAMPLE_DESCRIPTOR).unwrap();
        let mut engine =
            EngineState::new(&descriptor, Box::new(MemoryStorage::new()), &Capabilities::new());
        let mut hub = InteractionHub::new();
        assert!(matches!(
            hub.register_inline_editors(&mut engine),
            Err(EngineError::NoPage)
        ));

        engine
            .set_behaviour(docvar_registry::BehaviourSetting::InlineEditors, false)
            .unwrap();
        engine.attach_page(Page::new(Document::parse(PAGE))).unwrap();
        assert_eq!(hub.register_inline_editors(&mut engine).unwrap(), 0);
    }
}
