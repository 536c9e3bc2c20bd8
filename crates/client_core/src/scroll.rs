use tokio::sync::watch;

/// Broadcasts the vertical scroll offset of a view to its subscribers.
#[derive(Debug)]
pub struct ScrollObserver {
    tx: watch::Sender<f32>,
}

impl ScrollObserver {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0.0);
        Self { tx }
    }

    /// Records a scroll event. Every call counts as a new event, even when
    /// the offset did not move.
    pub fn publish(&self, offset_y: f32) {
        self.tx.send_modify(|current| *current = offset_y);
    }

    pub fn current(&self) -> f32 {
        *self.tx.borrow()
    }

    /// The subscription stays registered until the returned guard is dropped.
    pub fn subscribe(&self) -> ScrollSubscription {
        ScrollSubscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ScrollObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ScrollSubscription {
    rx: watch::Receiver<f32>,
}

impl ScrollSubscription {
    /// Returns the newest offset published since the last call, if any.
    pub fn take_latest(&mut self) -> Option<f32> {
        match self.rx.has_changed() {
            Ok(true) => Some(*self.rx.borrow_and_update()),
            _ => None,
        }
    }
}
