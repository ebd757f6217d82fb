//! Page wiring: attaches the core controllers to the server-rendered document.

use std::rc::Rc;
use std::time::Duration;

use gloo::console;
use gloo::events::EventListener;
use gloo::utils::{body, document, window};
use tracing::{debug, error, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlElement, HtmlInputElement};

use crate::core::error::JobRunError;
use crate::core::files::{ATTR_FILENAME, ATTR_GENERATED_FILE, ATTR_SUBDIR_NAME, collect_job_files};
use crate::core::flash::FlashSlot;
use crate::core::grid::{GRID_COLUMNS_PROPERTY, GridColumns};
use crate::core::jobs::{JobAction, JobPoller};
use crate::core::selection::{Notifier, SelectionSync};
use crate::core::theme::{DARK_MODE_CLASS, ThemeMode};
use crate::services::api::ApiClient;
use dom::{
    BrowserNotifier, CARD_SELECTOR, CardElement, FLASH_CLOSE_CLASS, FLASH_CONTAINER_ID,
    FlashContainer, GRID_DISPLAY_ID, GRID_SLIDER_ID, GlooTimer, SelectionSummary, StatusElement,
    THEME_TOGGLE_ID, TimeoutScheduler, job_element_ids, set_class,
};

mod dom;
mod preferences;
mod telemetry;

type Flash = Rc<FlashSlot<FlashContainer, TimeoutScheduler>>;

/// Entry point: install logging and attach every controller to the current page.
pub fn run_app() {
    console_error_panic_hook::set_once();
    let config = preferences::load_config();
    if let Err(err) = telemetry::init_logging(config.log_level) {
        let detail = err.to_string();
        console::error!("console logging unavailable", detail);
    }

    let api = ApiClient::new(config.clone());
    let flash = FlashSlot::new(
        FlashContainer::from_document(),
        TimeoutScheduler,
        config.flash_ttl,
    );

    attach_theme();
    attach_selection(&api);
    attach_jobs(&api, &flash, config.poll_interval);
    attach_flash_close(&flash);
    attach_grid(&api);
    info!(api_base = %config.api_base, "autocompose controller attached");
}

fn apply_theme(mode: ThemeMode, button: Option<&Element>) {
    set_class(&body(), DARK_MODE_CLASS, mode.is_dark());
    if let Some(button) = button {
        button.set_text_content(Some(mode.toggle_label()));
    }
}

fn attach_theme() {
    let button = document().get_element_by_id(THEME_TOGGLE_ID);
    apply_theme(preferences::load_theme(), button.as_ref());
    let Some(button) = button else {
        debug!("theme toggle not found");
        return;
    };
    let target = button.clone();
    EventListener::new(&target, "click", move |_event| {
        let current = if body().class_list().contains(DARK_MODE_CLASS) {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        };
        let next = current.toggled();
        apply_theme(next, Some(&button));
        preferences::persist_theme(next);
    })
    .forget();
}

fn attach_selection(api: &ApiClient) {
    let summary = SelectionSummary::from_document();
    let initial = summary.count_text();
    let sync = Rc::new(SelectionSync::new(api.clone(), summary, BrowserNotifier));
    if let Some(text) = initial {
        sync.initialize(&text);
    }

    let Ok(cards) = document().query_selector_all(CARD_SELECTOR) else {
        warn!("container cards could not be queried");
        return;
    };
    for index in 0..cards.length() {
        let Some(element) = cards
            .item(index)
            .and_then(|node| node.dyn_into::<Element>().ok())
        else {
            continue;
        };
        let card = Rc::new(CardElement::new(element.clone()));
        let sync = Rc::clone(&sync);
        EventListener::new(&element, "click", move |_event| {
            let card = Rc::clone(&card);
            let sync = Rc::clone(&sync);
            spawn_local(async move {
                let outcome = sync
                    .toggle(&*card, &card.item_id(), &card.item_name())
                    .await;
                debug!(?outcome, "toggle finished");
            });
        })
        .forget();
    }
    debug!(cards = cards.length(), "selection attached");
}

fn generated_file_entries() -> Vec<(Option<String>, Option<String>)> {
    let selector = format!("[{ATTR_GENERATED_FILE}]");
    let Ok(nodes) = document().query_selector_all(&selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .map(|element| {
            (
                element.get_attribute(ATTR_SUBDIR_NAME),
                element.get_attribute(ATTR_FILENAME),
            )
        })
        .collect()
}

fn attach_jobs(api: &ApiClient, flash: &Flash, interval: Duration) {
    let poller = Rc::new(JobPoller::new(
        api.clone(),
        GlooTimer,
        Rc::clone(flash),
        interval,
    ));
    for action in JobAction::all() {
        let (button_id, status_id) = job_element_ids(action);
        let Some(button) = document().get_element_by_id(button_id) else {
            debug!(id = button_id, "job button not found");
            continue;
        };
        let status = Rc::new(StatusElement::by_id(status_id));
        let poller = Rc::clone(&poller);
        EventListener::new(&button, "click", move |_event| {
            let files = match collect_job_files(generated_file_entries()) {
                Ok(files) => files,
                Err(err) => {
                    warn!(action = action.path_segment(), error = %err, "job not started");
                    BrowserNotifier.alert(&format!("Error initiating {}: {err}", action.label()));
                    return;
                }
            };
            let poller = Rc::clone(&poller);
            let status = Rc::clone(&status);
            spawn_local(async move {
                match poller.run(action, &files, &*status).await {
                    Ok(outcome) => debug!(?outcome, "job run finished"),
                    Err(JobRunError::Start { source }) => {
                        BrowserNotifier.alert(&format!(
                            "Error initiating {}: {}",
                            action.label(),
                            source.user_message()
                        ));
                    }
                    Err(JobRunError::Poll { source }) => error!(
                        operation = source.operation(),
                        error = %source,
                        detail = %source.user_message(),
                        "job status polling stopped"
                    ),
                }
            });
        })
        .forget();
    }

    EventListener::new(&window(), "pagehide", move |_event| {
        let cancelled = poller.cancel_all();
        debug!(cancelled, "poll chains cancelled on pagehide");
    })
    .forget();
}

fn attach_flash_close(flash: &Flash) {
    let Some(container) = document().get_element_by_id(FLASH_CONTAINER_ID) else {
        debug!("flash container not found");
        return;
    };
    let flash = Rc::clone(flash);
    EventListener::new(&container, "click", move |event| {
        let is_close = event
            .target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .is_some_and(|element| element.class_list().contains(FLASH_CLOSE_CLASS));
        if is_close {
            flash.dismiss();
        }
    })
    .forget();
}

fn attach_grid(api: &ApiClient) {
    let Some(slider) = document()
        .get_element_by_id(GRID_SLIDER_ID)
        .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
    else {
        debug!("column slider not found");
        return;
    };
    apply_grid(api, &slider.value());
    let api = api.clone();
    let target = slider.clone();
    EventListener::new(&target, "input", move |_event| {
        apply_grid(&api, &slider.value());
    })
    .forget();
}

fn apply_grid(api: &ApiClient, raw: &str) {
    let columns = match GridColumns::parse(raw) {
        Ok(columns) => columns,
        Err(err) => {
            warn!(value = raw, error = %err, "ignoring column slider value");
            return;
        }
    };
    let value = columns.css_value();
    if let Some(root) = document()
        .document_element()
        .and_then(|element| element.dyn_into::<HtmlElement>().ok())
        && let Err(err) = root.style().set_property(GRID_COLUMNS_PROPERTY, &value)
    {
        warn!(error = ?err, "grid column property not set");
    }
    if let Some(display) = document().get_element_by_id(GRID_DISPLAY_ID) {
        display.set_text_content(Some(&value));
    }

    let api = api.clone();
    spawn_local(async move {
        match api.update_columns(columns).await {
            Ok(reply) if reply.success => info!(
                num_cols = columns.get(),
                message = reply.message.as_deref().unwrap_or_default(),
                "column update stored"
            ),
            Ok(reply) => error!(
                num_cols = columns.get(),
                message = reply.message.as_deref().unwrap_or_default(),
                "column update rejected"
            ),
            Err(err) => error!(error = %err, detail = %err.user_message(), "column update failed"),
        }
    });
}
