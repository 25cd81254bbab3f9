//! The injected chat panel
//!
//! `WidgetShell` builds the panel, owns its visibility, and routes every host
//! event to the drag controller or the conversation controller.

pub mod dom;
pub mod drag;

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::WidgetConfig;
use crate::conversation::controller::{Completion, SubmitOutcome};
use crate::conversation::{ConversationController, ConversationHistory};
use crate::transport::ChatTransport;

use dom::PanelDom;
use drag::{DocumentListeners, DragController, ListenerKind, PointerPosition, WidgetPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetVisibility {
    #[default]
    Expanded,
    Collapsed,
}

impl WidgetVisibility {
    pub fn toggled(self) -> Self {
        match self {
            WidgetVisibility::Expanded => WidgetVisibility::Collapsed,
            WidgetVisibility::Collapsed => WidgetVisibility::Expanded,
        }
    }
}

/// Command delivered from outside the page, e.g. `{"action": "toggle"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ExternalCommand {
    Toggle,
    Expand,
    Collapse,
}

impl ExternalCommand {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Everything the host can deliver to the widget
#[derive(Debug)]
pub enum WidgetEvent {
    InputChanged(String),
    EnterPressed { shift: bool },
    SendClicked,
    MinimizeClicked,
    External(ExternalCommand),
    HeaderPointerDown(PointerPosition),
    DocumentPointerMove(PointerPosition),
    DocumentPointerUp,
    WindowPointerLeave,
    Completed(Completion),
}

pub struct WidgetShell {
    dom: PanelDom,
    visibility: WidgetVisibility,
    document: DocumentListeners,
    drag: DragController,
    conversation: ConversationController,
}

impl WidgetShell {
    /// Build and mount the panel, then submit `page_url` for ingestion.
    pub fn initialize(
        config: &WidgetConfig,
        page_url: &str,
        transport: Arc<dyn ChatTransport>,
        completions: UnboundedSender<Completion>,
    ) -> Self {
        let position = config.widget.position();

        let mut dom = PanelDom::new(&config.widget.title, &config.widget.placeholder, position);
        dom.attach();

        let document = DocumentListeners::new();
        let drag = DragController::new(position, document.clone());
        let conversation =
            ConversationController::new(transport, completions, config.chat.pending_policy);

        conversation.ingest_page(page_url);

        let mut shell = Self {
            dom,
            visibility: WidgetVisibility::Expanded,
            document,
            drag,
            conversation,
        };
        shell.sync_dom();

        tracing::info!(%page_url, "Widget mounted");
        shell
    }

    pub fn handle(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::InputChanged(text) => self.conversation.set_input(text),
            WidgetEvent::EnterPressed { shift: true } => self.conversation.insert_newline(),
            WidgetEvent::EnterPressed { shift: false } | WidgetEvent::SendClicked => {
                match self.conversation.submit() {
                    SubmitOutcome::Sent(request) => tracing::debug!(%request, "Question sent"),
                    SubmitOutcome::Queued { position } => {
                        tracing::debug!(position, "Question queued")
                    }
                    SubmitOutcome::Rejected(reason) => tracing::debug!(%reason, "Submit rejected"),
                }
            }
            WidgetEvent::MinimizeClicked => self.toggle_minimize(),
            WidgetEvent::External(command) => self.apply_external(command),
            WidgetEvent::HeaderPointerDown(at) => self.drag.pointer_down(at),
            WidgetEvent::DocumentPointerMove(at) => {
                if self.document.is_attached(ListenerKind::PointerMove) {
                    self.drag.pointer_move(at);
                }
            }
            WidgetEvent::DocumentPointerUp => {
                if self.document.is_attached(ListenerKind::PointerUp) {
                    self.drag.pointer_up();
                }
            }
            WidgetEvent::WindowPointerLeave => {
                if self.document.is_attached(ListenerKind::PointerLeave) {
                    self.drag.pointer_leave();
                }
            }
            WidgetEvent::Completed(Completion::Chat { request, result }) => {
                self.conversation.complete_chat(request, result);
            }
            WidgetEvent::Completed(Completion::Ingest(result)) => {
                self.conversation.complete_ingest(result);
            }
        }
        self.sync_dom();
    }

    pub fn toggle_minimize(&mut self) {
        self.set_visibility(self.visibility.toggled());
    }

    pub fn set_visibility(&mut self, visibility: WidgetVisibility) {
        if self.visibility != visibility {
            tracing::debug!(from = ?self.visibility, to = ?visibility, "Visibility changed");
            self.visibility = visibility;
        }
        self.sync_dom();
    }

    fn apply_external(&mut self, command: ExternalCommand) {
        match command {
            ExternalCommand::Toggle => self.toggle_minimize(),
            ExternalCommand::Expand => self.set_visibility(WidgetVisibility::Expanded),
            ExternalCommand::Collapse => self.set_visibility(WidgetVisibility::Collapsed),
        }
    }

    pub fn visibility(&self) -> WidgetVisibility {
        self.visibility
    }

    pub fn position(&self) -> WidgetPosition {
        self.drag.position()
    }

    pub fn history(&self) -> &ConversationHistory {
        self.conversation.history()
    }

    pub fn dom(&self) -> &PanelDom {
        &self.dom
    }

    pub fn html(&self) -> String {
        self.dom.to_html()
    }

    fn sync_dom(&mut self) {
        self.dom.sync(
            self.visibility,
            self.drag.position(),
            self.conversation.transcript_html(),
            self.conversation.input(),
        );
    }
}
