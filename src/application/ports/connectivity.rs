use crate::domain::value_objects::Connectivity;
use tokio::sync::watch;

pub trait ConnectivitySignal: Send + Sync {
    fn current(&self) -> Connectivity;
    fn subscribe(&self) -> watch::Receiver<Connectivity>;

    fn is_online(&self) -> bool {
        self.current().is_online()
    }
}
