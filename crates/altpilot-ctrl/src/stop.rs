use tokio::sync::watch;

/// Operator side of the stop signal.
#[derive(Debug)]
pub struct StopHandle(watch::Sender<bool>);

/// Loop side of the stop signal. Once requested it stays requested.
#[derive(Debug, Clone)]
pub struct StopSignal(watch::Receiver<bool>);

pub fn stop_pair() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle(tx), StopSignal(rx))
}

impl StopHandle {
    pub fn request(&self) {
        self.0.send_replace(true);
    }
}

impl StopSignal {
    /// A signal nobody can raise.
    pub fn never() -> Self {
        stop_pair().1
    }

    pub fn requested(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once a stop is requested; pends forever if the handle is gone
    /// without having requested one.
    pub async fn wait(&mut self) {
        if self.0.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
