//! DOM handles behind the core view, host and timer traits.

use std::time::Duration;

use async_trait::async_trait;
use autocompose_api_models::JobStatusReport;
use gloo::utils::document;
use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlButtonElement};

use crate::core::clock::{Scheduler, Timer};
use crate::core::flash::{FlashCategory, FlashHost};
use crate::core::jobs::{JobAction, JobObserver, status_line};
use crate::core::selection::{
    ItemView, Notifier, SelectionSummaryView, format_selected_count, icon_for,
};

pub(crate) const THEME_TOGGLE_ID: &str = "theme-toggle-btn";
pub(crate) const CARD_SELECTOR: &str = ".container-card";
pub(crate) const FLASH_CONTAINER_ID: &str = "flash-message-container";
pub(crate) const FLASH_CLOSE_CLASS: &str = "flash-close";
pub(crate) const GRID_SLIDER_ID: &str = "num_cols_slider";
pub(crate) const GRID_DISPLAY_ID: &str = "num_cols_display";

const COUNT_DISPLAY_ID: &str = "selected-count-display";
const GENERATE_BUTTON_IDS: [&str; 2] = ["generate-stack-btn", "generate-individuals-btn"];
const ATTR_CONTAINER_ID: &str = "data-container-id";
const ATTR_CONTAINER_NAME: &str = "data-container-name";
const SELECTED_CLASS: &str = "selected";
const LOADING_CLASS: &str = "loading";
const STATUS_CLASSES: [&str; 2] = ["success", "error"];

pub(crate) fn set_class(element: &Element, class: &str, on: bool) {
    if let Err(err) = element.class_list().toggle_with_force(class, on) {
        warn!(class, error = ?err, "class update failed");
    }
}

/// Button and status element ids for a job action.
pub(crate) const fn job_element_ids(action: JobAction) -> (&'static str, &'static str) {
    match action {
        JobAction::SaveToLocal => ("save-to-local-btn", "save-to-local-status"),
        JobAction::UploadToGithub => ("upload-to-github-btn", "upload-to-github-status"),
    }
}

pub(crate) struct CardElement {
    element: Element,
}

impl CardElement {
    pub(crate) const fn new(element: Element) -> Self {
        Self { element }
    }

    pub(crate) fn item_id(&self) -> String {
        self.element
            .get_attribute(ATTR_CONTAINER_ID)
            .unwrap_or_default()
    }

    pub(crate) fn item_name(&self) -> String {
        self.element
            .get_attribute(ATTR_CONTAINER_NAME)
            .unwrap_or_default()
    }

    fn icon(&self) -> Option<Element> {
        self.element.query_selector(".icon").ok().flatten()
    }
}

impl ItemView for CardElement {
    fn is_selected(&self) -> bool {
        self.element.class_list().contains(SELECTED_CLASS)
    }

    fn render_selected(&self, selected: bool) {
        set_class(&self.element, SELECTED_CLASS, selected);
        if let Some(icon) = self.icon() {
            icon.set_text_content(Some(icon_for(selected)));
        }
    }

    fn set_loading(&self, loading: bool) {
        set_class(&self.element, LOADING_CLASS, loading);
    }
}

pub(crate) struct SelectionSummary {
    count: Option<Element>,
    buttons: Vec<HtmlButtonElement>,
}

impl SelectionSummary {
    pub(crate) fn from_document() -> Self {
        let doc = document();
        let buttons = GENERATE_BUTTON_IDS
            .iter()
            .filter_map(|id| {
                let button = doc
                    .get_element_by_id(id)
                    .and_then(|element| element.dyn_into::<HtmlButtonElement>().ok());
                if button.is_none() {
                    debug!(id, "generate button not found");
                }
                button
            })
            .collect();
        Self {
            count: doc.get_element_by_id(COUNT_DISPLAY_ID),
            buttons,
        }
    }

    /// Server-rendered count label, absent when the page has no summary.
    pub(crate) fn count_text(&self) -> Option<String> {
        self.count
            .as_ref()
            .map(|element| element.text_content().unwrap_or_default())
    }
}

impl SelectionSummaryView for SelectionSummary {
    fn render_count(&self, count: u32) {
        if let Some(element) = &self.count {
            element.set_text_content(Some(&format_selected_count(count)));
        }
    }

    fn set_generate_enabled(&self, enabled: bool) {
        for button in &self.buttons {
            button.set_disabled(!enabled);
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct BrowserNotifier;

impl Notifier for BrowserNotifier {
    fn alert(&self, message: &str) {
        gloo::dialogs::alert(message);
    }
}

pub(crate) struct FlashContainer {
    container: Option<Element>,
}

impl FlashContainer {
    pub(crate) fn from_document() -> Self {
        Self {
            container: document().get_element_by_id(FLASH_CONTAINER_ID),
        }
    }
}

impl FlashHost for FlashContainer {
    type Node = Element;

    fn clear_unmanaged(&self) {
        let Some(container) = &self.container else {
            return;
        };
        let Ok(existing) = container.query_selector_all(".alert") else {
            return;
        };
        for node in (0..existing.length()).filter_map(|index| existing.item(index)) {
            if let Ok(element) = node.dyn_into::<Element>() {
                element.remove();
            }
        }
    }

    fn mount(&self, message: &str, category: FlashCategory) -> Option<Element> {
        let container = self.container.as_ref()?;
        let doc = document();
        let node = doc.create_element("div").ok()?;
        node.set_class_name(&category.css_class());
        node.set_text_content(Some(message));
        if let Ok(close) = doc.create_element("button") {
            close.set_class_name(FLASH_CLOSE_CLASS);
            close.set_text_content(Some("×"));
            if let Err(err) = close.set_attribute("aria-label", "Close") {
                debug!(error = ?err, "close button label not set");
            }
            if let Err(err) = node.append_child(&close) {
                debug!(error = ?err, "close button not attached");
            }
        }
        if let Err(err) = container.append_child(&node) {
            warn!(error = ?err, "flash node could not be attached");
            return None;
        }
        Some(node)
    }

    fn unmount(&self, node: Element) {
        node.remove();
    }
}

pub(crate) struct StatusElement {
    element: Option<Element>,
}

impl StatusElement {
    pub(crate) fn by_id(id: &str) -> Self {
        let element = document().get_element_by_id(id);
        if element.is_none() {
            debug!(id, "job status element not found");
        }
        Self { element }
    }

    fn render(&self, report: &JobStatusReport) {
        let Some(element) = &self.element else {
            return;
        };
        let line = status_line(report);
        element.set_text_content(Some(&line.text));
        for class in STATUS_CLASSES {
            set_class(element, class, line.class == Some(class));
        }
    }
}

impl JobObserver for StatusElement {
    fn on_in_progress(&self, report: &JobStatusReport) {
        self.render(report);
    }

    fn on_completed(&self, report: &JobStatusReport) {
        self.render(report);
    }

    fn on_failed(&self, report: &JobStatusReport) {
        self.render(report);
    }

    fn on_unrecognized(&self, report: &JobStatusReport) {
        self.render(report);
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

#[derive(Clone, Copy)]
pub(crate) struct GlooTimer;

#[async_trait(?Send)]
impl Timer for GlooTimer {
    async fn sleep(&self, duration: Duration) {
        TimeoutFuture::new(millis(duration)).await;
    }
}

#[derive(Clone, Copy)]
pub(crate) struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) {
        Timeout::new(millis(delay), task).forget();
    }
}
