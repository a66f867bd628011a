use crate::application::ports::connectivity::ConnectivitySignal;
use crate::domain::value_objects::Connectivity;
use tokio::sync::watch;

/// Holds the device's current reachability. The host feeds it through
/// `set_online`; subscribers only see real transitions.
pub struct ConnectivityMonitor {
    state: watch::Sender<Connectivity>,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        let (state, _) = watch::channel(Connectivity::from_online(online));
        Self { state }
    }

    /// Returns true when the state actually changed.
    pub fn set_online(&self, online: bool) -> bool {
        let next = Connectivity::from_online(online);
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            tracing::info!(target: "offline::connectivity", state = ?next, "connectivity changed");
        }
        changed
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivitySignal for ConnectivityMonitor {
    fn current(&self) -> Connectivity {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn only_transitions_are_published() {
        let monitor = ConnectivityMonitor::new(false);
        let mut rx = monitor.subscribe();

        assert!(!monitor.set_online(false));
        assert!(!rx.has_changed().unwrap());

        assert!(monitor.set_online(true));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Connectivity::Online);
        assert!(monitor.is_online());
    }
}
