//! Container selection synchronisation.
//!
//! # Design
//! - The server owns the selection set; the card only mirrors the last confirmed state.
//! - A toggle is `Pending -> Confirmed | RolledBack`; rollback restores the pre-click state.
//! - The selected count is never derived locally, only copied from responses.
//! - Both generate buttons are enabled iff the last known count is positive.

use std::cell::Cell;

use async_trait::async_trait;
use autocompose_api_models::{
    ItemId, SelectionConfirmation, ToggleSelectionRequest, ToggleSelectionResponse,
};
use tracing::{debug, error, info};

use crate::core::error::{ApiError, ItemError};

/// Icon glyph for a selected card.
pub const SELECTED_ICON: &str = "✅";
/// Icon glyph for an unselected card.
pub const UNSELECTED_ICON: &str = "🔲";

const OPERATION: &str = "toggle_selection";

/// Icon glyph for a selection state.
#[must_use]
pub const fn icon_for(selected: bool) -> &'static str {
    if selected {
        SELECTED_ICON
    } else {
        UNSELECTED_ICON
    }
}

/// Count label rendered into the selection summary.
#[must_use]
pub fn format_selected_count(count: u32) -> String {
    format!("Selected Containers: ({count})")
}

/// Extract the first parenthesised number from the server-rendered count text.
///
/// Missing or unparsable counts read as zero; counts beyond `u32::MAX` saturate.
#[must_use]
pub fn parse_selected_count(text: &str) -> u32 {
    text.match_indices('(')
        .find_map(|(start, _)| {
            let rest = &text[start + 1..];
            let digits_end = rest.find(|c: char| !c.is_ascii_digit())?;
            if digits_end == 0 || !rest[digits_end..].starts_with(')') {
                return None;
            }
            // Digits only, so the sole parse failure is overflow.
            Some(rest[..digits_end].parse::<u32>().unwrap_or(u32::MAX))
        })
        .unwrap_or(0)
}

/// Network seam for selection changes.
#[async_trait(?Send)]
pub trait SelectionApi {
    /// Flip an item's membership in the server-held selection set.
    async fn toggle_selection(
        &self,
        request: &ToggleSelectionRequest,
    ) -> Result<ToggleSelectionResponse, ApiError>;
}

/// Handle to one selectable card.
pub trait ItemView {
    /// Selection state currently rendered.
    fn is_selected(&self) -> bool;
    /// Render a selection state (class and icon).
    fn render_selected(&self, selected: bool);
    /// Show or hide the in-flight indicator.
    fn set_loading(&self, loading: bool);
}

/// Handle to the count label and the two generate buttons.
pub trait SelectionSummaryView {
    /// Render the authoritative selected count.
    fn render_count(&self, count: u32);
    /// Enable or disable both generate buttons.
    fn set_generate_enabled(&self, enabled: bool);
}

/// Blocking user-facing alerts.
pub trait Notifier {
    /// Show `message` to the user.
    fn alert(&self, message: &str);
}

/// Result of a toggle attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The server confirmed a state, which is now rendered.
    Confirmed(SelectionConfirmation),
    /// No authoritative state arrived; the pre-click state was restored.
    RolledBack {
        /// State rendered after the rollback.
        restored: bool,
        /// Failure that triggered the rollback.
        error: ApiError,
    },
    /// The card metadata was incomplete; nothing was sent.
    Aborted(ItemError),
}

/// An in-flight toggle. Dropping it always clears the loading indicator.
struct PendingToggle<'a, I: ItemView + ?Sized> {
    item: &'a I,
    previous: bool,
}

impl<'a, I: ItemView + ?Sized> PendingToggle<'a, I> {
    fn begin(item: &'a I) -> Self {
        let previous = item.is_selected();
        item.set_loading(true);
        item.render_selected(!previous);
        Self { item, previous }
    }

    fn confirm(self, confirmation: SelectionConfirmation) -> ToggleOutcome {
        self.item.render_selected(confirmation.selected);
        ToggleOutcome::Confirmed(confirmation)
    }

    fn roll_back(self, error: ApiError) -> ToggleOutcome {
        self.item.render_selected(self.previous);
        ToggleOutcome::RolledBack {
            restored: self.previous,
            error,
        }
    }
}

impl<I: ItemView + ?Sized> Drop for PendingToggle<'_, I> {
    fn drop(&mut self) {
        self.item.set_loading(false);
    }
}

/// Keeps card selection, the count label and the generate buttons in step with the server.
pub struct SelectionSync<A, S, N> {
    api: A,
    summary: S,
    notifier: N,
    last_count: Cell<u32>,
}

impl<A, S, N> SelectionSync<A, S, N>
where
    A: SelectionApi,
    S: SelectionSummaryView,
    N: Notifier,
{
    /// Wire the controller to its collaborators.
    pub const fn new(api: A, summary: S, notifier: N) -> Self {
        Self {
            api,
            summary,
            notifier,
            last_count: Cell::new(0),
        }
    }

    /// Apply button gating from the server-rendered count text at page load.
    pub fn initialize(&self, display_text: &str) -> u32 {
        let count = parse_selected_count(display_text);
        self.last_count.set(count);
        self.summary.set_generate_enabled(count > 0);
        debug!(count, "initial selection count");
        count
    }

    /// Last count received from the server (or parsed at page load).
    #[must_use]
    pub fn last_count(&self) -> u32 {
        self.last_count.get()
    }

    /// Toggle one card against the server.
    pub async fn toggle<I>(&self, item: &I, item_id: &str, item_name: &str) -> ToggleOutcome
    where
        I: ItemView + ?Sized,
    {
        let (item_id, item_name) = (item_id.trim(), item_name.trim());
        if item_id.is_empty() {
            error!("card is missing data-container-id");
            return ToggleOutcome::Aborted(ItemError::MissingId);
        }
        if item_name.is_empty() {
            error!(item_id, "card is missing data-container-name");
            return ToggleOutcome::Aborted(ItemError::MissingName);
        }

        let request = ToggleSelectionRequest {
            container_id: ItemId::new(item_id),
            container_name: item_name.to_string(),
        };
        let pending = PendingToggle::begin(item);
        let confirmed = self
            .api
            .toggle_selection(&request)
            .await
            .and_then(|response| {
                response
                    .into_confirmation(&request.container_id)
                    .map_err(|source| ApiError::Response {
                        operation: OPERATION,
                        source,
                    })
            });

        match confirmed {
            Ok(confirmation) => {
                info!(
                    item_id,
                    selected = confirmation.selected,
                    count = confirmation.selected_count,
                    "selection toggled"
                );
                self.apply_count(confirmation.selected_count);
                pending.confirm(confirmation)
            }
            Err(err) => {
                error!(item_id, error = %err, detail = %err.user_message(), "selection toggle failed");
                self.notifier
                    .alert(&format!("Error updating selection: {}", err.user_message()));
                pending.roll_back(err)
            }
        }
    }

    fn apply_count(&self, count: u32) {
        self.last_count.set(count);
        self.summary.render_count(count);
        self.summary.set_generate_enabled(count > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeCard {
        selected: Cell<bool>,
        loading: Cell<bool>,
        loading_history: RefCell<Vec<bool>>,
        rendered: RefCell<Vec<bool>>,
    }

    impl FakeCard {
        fn icon(&self) -> &'static str {
            icon_for(self.selected.get())
        }
    }

    impl ItemView for FakeCard {
        fn is_selected(&self) -> bool {
            self.selected.get()
        }

        fn render_selected(&self, selected: bool) {
            self.selected.set(selected);
            self.rendered.borrow_mut().push(selected);
        }

        fn set_loading(&self, loading: bool) {
            self.loading.set(loading);
            self.loading_history.borrow_mut().push(loading);
        }
    }

    #[derive(Default)]
    struct FakeSummary {
        count_text: RefCell<Option<String>>,
        enabled: Cell<Option<bool>>,
    }

    impl SelectionSummaryView for Rc<FakeSummary> {
        fn render_count(&self, count: u32) {
            *self.count_text.borrow_mut() = Some(format_selected_count(count));
        }

        fn set_generate_enabled(&self, enabled: bool) {
            self.enabled.set(Some(enabled));
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        alerts: RefCell<Vec<String>>,
    }

    impl Notifier for Rc<FakeNotifier> {
        fn alert(&self, message: &str) {
            self.alerts.borrow_mut().push(message.to_string());
        }
    }

    #[derive(Default)]
    struct ScriptedApi {
        replies: RefCell<VecDeque<Result<ToggleSelectionResponse, ApiError>>>,
        requests: RefCell<Vec<ToggleSelectionRequest>>,
    }

    impl ScriptedApi {
        fn reply(&self, reply: Result<ToggleSelectionResponse, ApiError>) {
            self.replies.borrow_mut().push_back(reply);
        }
    }

    #[async_trait(?Send)]
    impl SelectionApi for Rc<ScriptedApi> {
        async fn toggle_selection(
            &self,
            request: &ToggleSelectionRequest,
        ) -> Result<ToggleSelectionResponse, ApiError> {
            self.requests.borrow_mut().push(request.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("unexpected toggle request")
        }
    }

    type Reply = Result<ToggleSelectionResponse, ApiError>;

    /// Replies keyed by container id, each after a number of scheduler yields.
    #[derive(Default)]
    struct KeyedApi {
        replies: RefCell<HashMap<String, (usize, Reply)>>,
        requests: RefCell<Vec<String>>,
    }

    impl KeyedApi {
        fn reply(&self, id: &str, yields: usize, reply: Reply) {
            self.replies
                .borrow_mut()
                .insert(id.to_string(), (yields, reply));
        }
    }

    #[async_trait(?Send)]
    impl SelectionApi for Rc<KeyedApi> {
        async fn toggle_selection(
            &self,
            request: &ToggleSelectionRequest,
        ) -> Result<ToggleSelectionResponse, ApiError> {
            let id = request.container_id.as_str().to_string();
            self.requests.borrow_mut().push(id.clone());
            let (yields, reply) = self
                .replies
                .borrow_mut()
                .remove(&id)
                .expect("unexpected toggle request");
            for _ in 0..yields {
                tokio::task::yield_now().await;
            }
            reply
        }
    }

    struct Harness {
        sync: SelectionSync<Rc<ScriptedApi>, Rc<FakeSummary>, Rc<FakeNotifier>>,
        api: Rc<ScriptedApi>,
        summary: Rc<FakeSummary>,
        notifier: Rc<FakeNotifier>,
    }

    fn harness() -> Harness {
        let api = Rc::new(ScriptedApi::default());
        let summary = Rc::new(FakeSummary::default());
        let notifier = Rc::new(FakeNotifier::default());
        Harness {
            sync: SelectionSync::new(api.clone(), summary.clone(), notifier.clone()),
            api,
            summary,
            notifier,
        }
    }

    fn confirmed(id: &str, selected: bool, count: u32) -> ToggleSelectionResponse {
        ToggleSelectionResponse {
            success: true,
            id: Some(ItemId::new(id)),
            name: Some("web".into()),
            selected: Some(selected),
            selected_count: Some(count),
            error: None,
        }
    }

    #[test]
    fn initial_count_is_parsed_from_label() {
        assert_eq!(parse_selected_count("Selected Containers: (7)"), 7);
        assert_eq!(parse_selected_count("(x) then (12)"), 12);
        assert_eq!(parse_selected_count("Selected Containers: ()"), 0);
        assert_eq!(parse_selected_count("none"), 0);
        assert_eq!(parse_selected_count("(3"), 0);
        assert_eq!(parse_selected_count("Selected Containers: (99999999999)"), u32::MAX);
        assert_eq!(parse_selected_count(&format!("({})", "9".repeat(40))), u32::MAX);
    }

    #[test]
    fn initialize_gates_buttons() {
        let h = harness();
        assert_eq!(h.sync.initialize("Selected Containers: (0)"), 0);
        assert_eq!(h.summary.enabled.get(), Some(false));
        h.sync.initialize("Selected Containers: (2)");
        assert_eq!(h.summary.enabled.get(), Some(true));
        assert_eq!(h.summary.count_text.borrow().as_deref(), None);
    }

    #[tokio::test]
    async fn confirmed_toggle_renders_server_state_and_count() {
        let h = harness();
        let card = FakeCard::default();
        // Server says "not selected" even though the click assumed selection.
        h.api.reply(Ok(confirmed("abc", false, 9)));

        let outcome = h.sync.toggle(&card, "abc", "web").await;

        assert!(matches!(outcome, ToggleOutcome::Confirmed(_)));
        assert!(!card.selected.get());
        assert_eq!(card.icon(), UNSELECTED_ICON);
        assert_eq!(
            h.summary.count_text.borrow().as_deref(),
            Some("Selected Containers: (9)")
        );
        assert_eq!(h.summary.enabled.get(), Some(true));
        assert_eq!(h.sync.last_count(), 9);
        assert_eq!(h.api.requests.borrow()[0].container_name, "web");
    }

    #[tokio::test]
    async fn count_is_copied_not_incremented() {
        let h = harness();
        let card = FakeCard::default();
        h.sync.initialize("Selected Containers: (1)");
        h.api.reply(Ok(confirmed("abc", true, 5)));
        h.api.reply(Ok(confirmed("abc", true, 5)));

        h.sync.toggle(&card, "abc", "web").await;
        h.sync.toggle(&card, "abc", "web").await;

        assert_eq!(h.sync.last_count(), 5);
        assert_eq!(
            h.summary.count_text.borrow().as_deref(),
            Some("Selected Containers: (5)")
        );
    }

    #[tokio::test]
    async fn zero_count_disables_generate_buttons() {
        let h = harness();
        let card = FakeCard::default();
        card.selected.set(true);
        h.sync.initialize("Selected Containers: (1)");
        h.api.reply(Ok(confirmed("abc", false, 0)));

        h.sync.toggle(&card, "abc", "web").await;

        assert_eq!(h.summary.enabled.get(), Some(false));
    }

    #[tokio::test]
    async fn failed_toggle_restores_previous_state() {
        let h = harness();
        let card = FakeCard::default();
        card.selected.set(true);
        h.sync.initialize("Selected Containers: (4)");
        h.api.reply(Err(ApiError::Status {
            operation: "toggle_selection",
            status: 500,
            detail: None,
        }));

        let outcome = h.sync.toggle(&card, "abc", "web").await;

        assert!(matches!(
            outcome,
            ToggleOutcome::RolledBack { restored: true, .. }
        ));
        assert!(card.selected.get());
        assert_eq!(card.icon(), SELECTED_ICON);
        assert_eq!(*card.rendered.borrow(), vec![false, true]);
        assert_eq!(
            *h.notifier.alerts.borrow(),
            vec!["Error updating selection: Server responded with 500".to_string()]
        );
        assert_eq!(h.sync.last_count(), 4);
        assert_eq!(h.summary.count_text.borrow().as_deref(), None);
    }

    #[tokio::test]
    async fn rejected_response_is_a_failure() {
        let h = harness();
        let card = FakeCard::default();
        h.api.reply(Ok(ToggleSelectionResponse {
            success: false,
            error: Some("session expired".into()),
            ..ToggleSelectionResponse::default()
        }));

        let outcome = h.sync.toggle(&card, "abc", "web").await;

        assert!(matches!(
            outcome,
            ToggleOutcome::RolledBack { restored: false, .. }
        ));
        assert!(!card.selected.get());
        assert_eq!(
            h.notifier.alerts.borrow()[0],
            "Error updating selection: session expired"
        );
    }

    #[tokio::test]
    async fn loading_flag_is_cleared_on_every_path() {
        let h = harness();
        let ok_card = FakeCard::default();
        let failing_card = FakeCard::default();
        h.api.reply(Ok(confirmed("a", true, 1)));
        h.api.reply(Err(ApiError::Transport {
            operation: "toggle_selection",
            detail: "offline".into(),
        }));

        h.sync.toggle(&ok_card, "a", "web").await;
        h.sync.toggle(&failing_card, "b", "db").await;

        assert_eq!(*ok_card.loading_history.borrow(), vec![true, false]);
        assert_eq!(*failing_card.loading_history.borrow(), vec![true, false]);
        assert!(!failing_card.loading.get());
    }

    #[tokio::test]
    async fn overlapping_toggles_settle_independently() {
        let api = Rc::new(KeyedApi::default());
        let summary = Rc::new(FakeSummary::default());
        let notifier = Rc::new(FakeNotifier::default());
        let sync = SelectionSync::new(api.clone(), summary.clone(), notifier.clone());
        sync.initialize("Selected Containers: (1)");
        let a = FakeCard::default();
        a.selected.set(true);
        let b = FakeCard::default();
        // `a` is sent first but answers last.
        api.reply(
            "a",
            5,
            Err(ApiError::Transport {
                operation: "toggle_selection",
                detail: "offline".into(),
            }),
        );
        api.reply("b", 1, Ok(confirmed("b", true, 1)));

        let (first, second) = tokio::join!(
            sync.toggle(&a, "a", "web"),
            sync.toggle(&b, "b", "db")
        );

        assert_eq!(*api.requests.borrow(), vec!["a".to_string(), "b".to_string()]);
        assert!(matches!(
            first,
            ToggleOutcome::RolledBack { restored: true, .. }
        ));
        assert!(matches!(second, ToggleOutcome::Confirmed(ref c) if c.selected));
        assert_eq!(*a.loading_history.borrow(), vec![true, false]);
        assert_eq!(*b.loading_history.borrow(), vec![true, false]);
        assert_eq!(*a.rendered.borrow(), vec![false, true]);
        assert_eq!(*b.rendered.borrow(), vec![true, true]);
        assert!(a.selected.get());
        assert!(b.selected.get());
        assert_eq!(sync.last_count(), 1);
        assert_eq!(
            summary.count_text.borrow().as_deref(),
            Some("Selected Containers: (1)")
        );
        assert_eq!(notifier.alerts.borrow().len(), 1);
    }

    #[tokio::test]
    async fn incomplete_card_never_hits_the_network() {
        let h = harness();
        let card = FakeCard::default();

        let missing_id = h.sync.toggle(&card, " ", "web").await;
        let missing_name = h.sync.toggle(&card, "abc", "").await;

        assert_eq!(missing_id, ToggleOutcome::Aborted(ItemError::MissingId));
        assert_eq!(missing_name, ToggleOutcome::Aborted(ItemError::MissingName));
        assert!(h.api.requests.borrow().is_empty());
        assert!(card.loading_history.borrow().is_empty());
    }
}
