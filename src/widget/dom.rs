//! Headless model of the injected panel
//!
//! The shell owns one `PanelDom` and refreshes its derived fields after every
//! event; `to_html` is what a host would mount into the page.

use crate::render::escape_html;

use super::drag::WidgetPosition;
use super::WidgetVisibility;

pub const WIDGET_ID: &str = "api-doc-ai-widget";

#[derive(Debug, Clone)]
pub struct PanelDom {
    title: String,
    placeholder: String,
    attached: bool,
    visibility: WidgetVisibility,
    position: WidgetPosition,
    messages_html: String,
    input_value: String,
    scroll_to_bottom: bool,
}

impl PanelDom {
    pub fn new(title: &str, placeholder: &str, position: WidgetPosition) -> Self {
        Self {
            title: title.to_string(),
            placeholder: placeholder.to_string(),
            attached: false,
            visibility: WidgetVisibility::Expanded,
            position,
            messages_html: String::new(),
            input_value: String::new(),
            scroll_to_bottom: false,
        }
    }

    /// Mount into the host document
    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn minimize_label(&self) -> &'static str {
        match self.visibility {
            WidgetVisibility::Expanded => "−",
            WidgetVisibility::Collapsed => "+",
        }
    }

    pub fn body_display(&self) -> &'static str {
        match self.visibility {
            WidgetVisibility::Expanded => "flex",
            WidgetVisibility::Collapsed => "none",
        }
    }

    /// Set when the message list grew and should be scrolled to its end
    pub fn scroll_to_bottom(&self) -> bool {
        self.scroll_to_bottom
    }

    pub(crate) fn sync(
        &mut self,
        visibility: WidgetVisibility,
        position: WidgetPosition,
        messages_html: String,
        input_value: &str,
    ) {
        self.scroll_to_bottom = messages_html.len() > self.messages_html.len();
        self.visibility = visibility;
        self.position = position;
        self.messages_html = messages_html;
        self.input_value.clear();
        self.input_value.push_str(input_value);
    }

    pub fn to_html(&self) -> String {
        format!(
            concat!(
                r#"<div id="{id}" style="top: {top}px; left: {left}px;">"#,
                r#"<div class="widget-header"><h3>{title}</h3>"#,
                r#"<button id="minimize-chat">{label}</button></div>"#,
                r#"<div class="chat-container" style="display: {display};">"#,
                r#"<div id="chat-messages">{messages}</div>"#,
                r#"<div class="input-container">"#,
                r#"<textarea id="user-input" placeholder="{placeholder}">{input}</textarea>"#,
                r#"<button id="send-message">Send</button>"#,
                r#"</div></div></div>"#
            ),
            id = WIDGET_ID,
            top = self.position.top,
            left = self.position.left,
            title = escape_html(&self.title),
            label = self.minimize_label(),
            display = self.body_display(),
            messages = self.messages_html,
            placeholder = escape_html(&self.placeholder),
            input = escape_html(&self.input_value),
        )
    }
}
