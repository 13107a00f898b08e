use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::debug;
use vd_chain_client::ListenerHandle;

/// Caller hook for the selected account; `None` means no account is exposed.
pub type AccountListener = Rc<dyn Fn(Option<&str>)>;

/// Lowercased account, `None` for a missing or empty address.
pub fn normalize_account(account: Option<&str>) -> Option<String> {
    account
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_lowercase)
}

/// Account currently selected in the wallet, as last reported to the caller.
#[derive(Debug, Clone, Default)]
pub struct AccountTracker {
    current: Rc<RefCell<Option<String>>>,
}

impl AccountTracker {
    pub fn new(initial: Option<&str>) -> Self {
        Self {
            current: Rc::new(RefCell::new(normalize_account(initial))),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    /// Records `account` and returns it normalized if it differs from the
    /// tracked one. Returns `None` when nothing changed.
    pub fn update(&self, account: Option<&str>) -> Option<Option<String>> {
        let next = normalize_account(account);
        let mut current = self.current.borrow_mut();
        if *current == next {
            return None;
        }
        *current = next.clone();
        Some(next)
    }
}

/// Live listeners registered by `initialize`.
///
/// Listeners stay attached for the life of the page unless `unsubscribe`
/// is called; dropping the handle does not detach them.
#[derive(Default)]
pub struct Subscription {
    listeners: Vec<ListenerHandle>,
    tracker: Option<AccountTracker>,
    closed: Rc<Cell<bool>>,
}

impl Subscription {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, handle: ListenerHandle) {
        self.listeners.push(handle);
    }

    pub(crate) fn set_tracker(&mut self, tracker: AccountTracker) {
        self.tracker = Some(tracker);
    }

    pub(crate) fn closed_flag(&self) -> Rc<Cell<bool>> {
        self.closed.clone()
    }

    /// Account as last seen by the account listener.
    pub fn current_account(&self) -> Option<String> {
        self.tracker.as_ref().and_then(AccountTracker::current)
    }

    pub fn is_active(&self) -> bool {
        !self.closed.get() && !self.listeners.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn unsubscribe(self) {
        self.closed.set(true);
        for handle in self.listeners {
            handle.remove();
        }
        debug!("connection listeners removed");
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("listeners", &self.listeners.len())
            .field("current_account", &self.current_account())
            .field("closed", &self.closed.get())
            .finish()
    }
}

/// Event sink shared by both provider shapes: forwards genuine account
/// switches to the caller.
pub(crate) fn account_updater(
    tracker: AccountTracker,
    listener: AccountListener,
    closed: Rc<Cell<bool>>,
) -> impl Fn(Option<&str>) + 'static {
    move |account: Option<&str>| {
        if closed.get() {
            return;
        }
        if let Some(next) = tracker.update(account) {
            debug!(account = ?next, "wallet account changed");
            listener(next.as_deref());
        }
    }
}
