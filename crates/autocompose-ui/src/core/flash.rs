//! Single-slot flash notifications.
//!
//! # Design
//! - At most one notification is mounted; showing a new one unmounts the old one first.
//! - Each notification gets a monotonic id; expiry only removes the id it was scheduled for.
//! - Mounting goes through [`FlashHost`] so the slot never touches the DOM directly.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::clock::Scheduler;

/// Styling category of a notification, rendered as `alert-{category}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FlashCategory {
    /// Green confirmation.
    Success,
    /// Neutral information (fallback).
    #[default]
    Info,
    /// Yellow warning.
    Warning,
    /// Red failure, as emitted by the server's flash categories.
    Danger,
    /// Red failure.
    Error,
}

impl FlashCategory {
    /// Map a server category; unknown or absent values become [`FlashCategory::Info`].
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("success") => Self::Success,
            Some("warning") => Self::Warning,
            Some("danger") => Self::Danger,
            Some("error") => Self::Error,
            Some("info") | None => Self::Info,
            Some(other) => {
                debug!(category = other, "unknown flash category; using info");
                Self::Info
            }
        }
    }

    /// Category name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Error => "error",
        }
    }

    /// Full class attribute for the notification node.
    #[must_use]
    pub fn css_class(self) -> String {
        format!("alert alert-{}", self.as_str())
    }
}

/// Mounts and unmounts notification nodes.
pub trait FlashHost {
    /// Handle to a mounted node.
    type Node: 'static;

    /// Remove notifications the slot did not mount, such as server-rendered flashes.
    fn clear_unmanaged(&self);

    /// Insert a notification; `None` when the container is unavailable.
    fn mount(&self, message: &str, category: FlashCategory) -> Option<Self::Node>;

    /// Remove a previously mounted node.
    fn unmount(&self, node: Self::Node);
}

/// Anything that can display a one-shot notification.
pub trait FlashSink {
    /// Display `message`, replacing whatever is currently shown.
    fn flash(&self, message: &str, category: FlashCategory);
}

struct Displayed<N> {
    id: u64,
    node: N,
}

/// The shared notification slot.
pub struct FlashSlot<H: FlashHost, S: Scheduler> {
    host: H,
    scheduler: S,
    ttl: Duration,
    current: RefCell<Option<Displayed<H::Node>>>,
    next_id: Cell<u64>,
    this: Weak<Self>,
}

impl<H, S> FlashSlot<H, S>
where
    H: FlashHost + 'static,
    S: Scheduler + 'static,
{
    /// Create a slot whose notifications expire after `ttl`.
    #[must_use]
    pub fn new(host: H, scheduler: S, ttl: Duration) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            host,
            scheduler,
            ttl,
            current: RefCell::new(None),
            next_id: Cell::new(0),
            this: this.clone(),
        })
    }

    /// Show a notification, returning its id when it was mounted.
    pub fn show(&self, message: &str, category: FlashCategory) -> Option<u64> {
        self.dismiss();
        self.host.clear_unmanaged();
        let Some(node) = self.host.mount(message, category) else {
            warn!("flash container unavailable; dropping notification");
            return None;
        };
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);
        *self.current.borrow_mut() = Some(Displayed { id, node });

        let slot = self.this.clone();
        self.scheduler.schedule(
            self.ttl,
            Box::new(move || {
                if let Some(slot) = slot.upgrade() {
                    slot.expire(id);
                }
            }),
        );
        debug!(id, category = category.as_str(), "flash shown");
        Some(id)
    }

    /// Remove the current notification, if any.
    pub fn dismiss(&self) -> bool {
        let previous = self.current.borrow_mut().take();
        previous.is_some_and(|shown| {
            self.host.unmount(shown.node);
            true
        })
    }

    /// Id of the notification currently shown.
    #[must_use]
    pub fn current_id(&self) -> Option<u64> {
        self.current.borrow().as_ref().map(|shown| shown.id)
    }

    fn expire(&self, id: u64) {
        let expired = {
            let mut current = self.current.borrow_mut();
            if current.as_ref().is_some_and(|shown| shown.id == id) {
                current.take()
            } else {
                None
            }
        };
        if let Some(shown) = expired {
            self.host.unmount(shown.node);
            debug!(id, "flash expired");
        }
    }
}

impl<H, S> FlashSink for FlashSlot<H, S>
where
    H: FlashHost + 'static,
    S: Scheduler + 'static,
{
    fn flash(&self, message: &str, category: FlashCategory) {
        self.show(message, category);
    }
}

impl<T: FlashSink + ?Sized> FlashSink for Rc<T> {
    fn flash(&self, message: &str, category: FlashCategory) {
        (**self).flash(message, category);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{ManualScheduler, MemoryHost};
    use super::*;

    type Slot = Rc<FlashSlot<Rc<MemoryHost>, Rc<ManualScheduler>>>;

    fn slot() -> (Slot, Rc<MemoryHost>, Rc<ManualScheduler>) {
        let host = Rc::new(MemoryHost::default());
        let scheduler = Rc::new(ManualScheduler::default());
        let slot = FlashSlot::new(host.clone(), scheduler.clone(), Duration::from_secs(5));
        (slot, host, scheduler)
    }

    #[test]
    fn categories_map_to_alert_classes() {
        assert_eq!(
            FlashCategory::parse(Some("success")).css_class(),
            "alert alert-success"
        );
        assert_eq!(FlashCategory::parse(Some("danger")), FlashCategory::Danger);
        assert_eq!(FlashCategory::parse(Some("sparkly")), FlashCategory::Info);
        assert_eq!(FlashCategory::parse(None), FlashCategory::Info);
    }

    #[test]
    fn new_notification_replaces_current_one() {
        let (slot, host, _) = slot();
        slot.show("first", FlashCategory::Info);
        slot.show("second", FlashCategory::Success);
        let mounted = host.mounted.borrow();
        assert_eq!(mounted.len(), 1);
        assert_eq!(mounted[0].1, "second");
    }

    #[test]
    fn notification_expires_after_ttl() {
        let (slot, host, scheduler) = slot();
        slot.show("Saved 3 files", FlashCategory::Success);
        assert_eq!(scheduler.queued.borrow()[0].0, Duration::from_secs(5));
        scheduler.run_all();
        assert!(host.mounted.borrow().is_empty());
        assert_eq!(slot.current_id(), None);
    }

    #[test]
    fn stale_expiry_leaves_newer_notification() {
        let (slot, host, scheduler) = slot();
        slot.show("first", FlashCategory::Info);
        let second = slot.show("second", FlashCategory::Info);
        scheduler.run_first();
        assert_eq!(slot.current_id(), second);
        assert_eq!(host.mounted.borrow().len(), 1);
        scheduler.run_first();
        assert!(host.mounted.borrow().is_empty());
    }

    #[test]
    fn manual_dismiss_clears_slot() {
        let (slot, host, scheduler) = slot();
        slot.show("hello", FlashCategory::Warning);
        assert!(slot.dismiss());
        assert!(!slot.dismiss());
        scheduler.run_all();
        assert!(host.mounted.borrow().is_empty());
    }

    #[test]
    fn every_server_rendered_flash_is_replaced() {
        let (slot, host, _) = slot();
        host.rendered_by_server
            .borrow_mut()
            .extend(["Batch generated".to_string(), "2 containers selected".to_string()]);

        slot.show("Saved 3 files", FlashCategory::Success);

        assert!(host.rendered_by_server.borrow().is_empty());
        assert_eq!(host.mounted.borrow().len(), 1);
    }

    #[test]
    fn missing_container_is_a_no_op() {
        let (slot, host, scheduler) = slot();
        host.unavailable.set(true);
        assert_eq!(slot.show("lost", FlashCategory::Info), None);
        assert!(scheduler.queued.borrow().is_empty());
    }
}
