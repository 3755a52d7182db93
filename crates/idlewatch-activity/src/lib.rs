//! Interaction-signal observation for Idlewatch.
//!
//! The host environment — a browser shell, a kiosk runtime, a TUI —
//! knows when the user touches the machine. Idlewatch doesn't bind to
//! any particular UI framework; instead the host implements the
//! [`InteractionHost`] capability ("register/unregister a listener for a
//! named interaction signal at the outermost scope") and the
//! [`ActivityObserver`] forwards every signal into the coordinator's
//! activity channel.
//!
//! The observer is deliberately dumb: every signal is forwarded
//! unconditionally, and throttling lives in the session store. That
//! keeps this layer stateless apart from remembering what it registered,
//! which is exactly the bookkeeping teardown needs.

use tokio::sync::mpsc;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

/// The interaction signal kinds treated as evidence of session use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    PointerDown,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
}

/// Every signal the observer subscribes to. Registration must happen at
/// the outermost capture scope so no descendant can suppress a signal.
pub const ACTIVITY_SIGNALS: [ActivityKind; 5] = [
    ActivityKind::PointerDown,
    ActivityKind::KeyPress,
    ActivityKind::Scroll,
    ActivityKind::TouchStart,
    ActivityKind::Click,
];

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PointerDown => write!(f, "pointer-down"),
            Self::KeyPress => write!(f, "key-press"),
            Self::Scroll => write!(f, "scroll"),
            Self::TouchStart => write!(f, "touch-start"),
            Self::Click => write!(f, "click"),
        }
    }
}

// ---------------------------------------------------------------------------
// InteractionHost
// ---------------------------------------------------------------------------

/// Callback the host invokes whenever a subscribed signal occurs.
pub type SignalListener = Box<dyn Fn(ActivityKind) + Send + Sync>;

/// Capability the host environment provides: listener registration for
/// named interaction signals.
///
/// Implemented over DOM events behind an FFI shim in a browser, over an
/// input loop on a kiosk, or over a plain `HashMap` in tests. At most
/// one listener per signal is registered by the observer; registering a
/// signal again replaces the previous listener.
pub trait InteractionHost {
    /// Installs `listener` for `signal` at the outermost scope.
    fn register(&mut self, signal: ActivityKind, listener: SignalListener);

    /// Removes the listener for `signal`. Unregistering a signal with
    /// no listener is a no-op.
    fn unregister(&mut self, signal: ActivityKind);
}

// ---------------------------------------------------------------------------
// ActivityObserver
// ---------------------------------------------------------------------------

/// Forwards interaction signals into the coordinator's activity channel.
///
/// `attach` registers a listener for every signal in
/// [`ACTIVITY_SIGNALS`]; `detach` removes exactly that set. A leaked
/// listener is a defect — dropping an observer that was never detached
/// logs a warning, since the host still holds its listeners.
pub struct ActivityObserver {
    registered: Vec<ActivityKind>,
}

impl ActivityObserver {
    /// Registers every activity signal on `host`, forwarding into
    /// `sink`.
    ///
    /// Sends are fire-and-forget: a closed sink (coordinator shut down)
    /// just drops the signal.
    pub fn attach<H: InteractionHost>(
        host: &mut H,
        sink: mpsc::UnboundedSender<ActivityKind>,
    ) -> Self {
        let mut registered = Vec::with_capacity(ACTIVITY_SIGNALS.len());
        for signal in ACTIVITY_SIGNALS {
            let sink = sink.clone();
            host.register(
                signal,
                Box::new(move |kind| {
                    let _ = sink.send(kind);
                }),
            );
            registered.push(signal);
        }
        debug!(signals = registered.len(), "activity observer attached");
        Self { registered }
    }

    /// Unregisters every signal this observer added.
    pub fn detach<H: InteractionHost>(mut self, host: &mut H) {
        for signal in self.registered.drain(..) {
            host.unregister(signal);
        }
        debug!("activity observer detached");
    }

    /// The signals currently registered on the host.
    pub fn registered(&self) -> &[ActivityKind] {
        &self.registered
    }
}

impl Drop for ActivityObserver {
    fn drop(&mut self) {
        if !self.registered.is_empty() {
            warn!(
                signals = self.registered.len(),
                "activity observer dropped without detach — host listeners leak"
            );
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// A fake host: a listener table plus a way to simulate signals.
    #[derive(Default)]
    struct FakeHost {
        listeners: HashMap<ActivityKind, SignalListener>,
    }

    impl FakeHost {
        fn fire(&self, signal: ActivityKind) {
            if let Some(listener) = self.listeners.get(&signal) {
                listener(signal);
            }
        }
    }

    impl InteractionHost for FakeHost {
        fn register(&mut self, signal: ActivityKind, listener: SignalListener) {
            self.listeners.insert(signal, listener);
        }

        fn unregister(&mut self, signal: ActivityKind) {
            self.listeners.remove(&signal);
        }
    }

    #[test]
    fn test_attach_registers_every_signal() {
        let mut host = FakeHost::default();
        let (tx, _rx) = mpsc::unbounded_channel();

        let observer = ActivityObserver::attach(&mut host, tx);

        assert_eq!(host.listeners.len(), ACTIVITY_SIGNALS.len());
        assert_eq!(observer.registered(), ACTIVITY_SIGNALS.as_slice());
        observer.detach(&mut host);
    }

    #[test]
    fn test_signals_forward_unconditionally() {
        let mut host = FakeHost::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let observer = ActivityObserver::attach(&mut host, tx);

        // Rapid-fire signals all pass through — throttling is not this
        // layer's job.
        host.fire(ActivityKind::KeyPress);
        host.fire(ActivityKind::KeyPress);
        host.fire(ActivityKind::Scroll);

        assert_eq!(rx.try_recv().unwrap(), ActivityKind::KeyPress);
        assert_eq!(rx.try_recv().unwrap(), ActivityKind::KeyPress);
        assert_eq!(rx.try_recv().unwrap(), ActivityKind::Scroll);
        assert!(rx.try_recv().is_err());
        observer.detach(&mut host);
    }

    #[test]
    fn test_detach_removes_every_listener() {
        let mut host = FakeHost::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let observer = ActivityObserver::attach(&mut host, tx);

        observer.detach(&mut host);

        assert!(host.listeners.is_empty());
        host.fire(ActivityKind::Click);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_sink_does_not_panic() {
        let mut host = FakeHost::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = ActivityObserver::attach(&mut host, tx);
        drop(rx);

        host.fire(ActivityKind::PointerDown);

        observer.detach(&mut host);
    }
}
