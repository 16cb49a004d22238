//! The long-lived core object the host holds through an opaque pointer.
//!
//! A [`Core`] owns the configuration, the transport to the collaborating
//! service and the worker pool of its asynchronous path. Everything the
//! workers need lives in [`Shared`], which is reference counted so a job
//! never outlives the state it reads.

pub mod inflight;
pub mod registry;

use std::sync::Arc;

use crate::api::types::Callback;
use crate::client::{Transport, UreqTransport};
use crate::common::buf::OwnedBuffer;
use crate::common::config::CoreCfg;
use crate::common::error::CoreResult;
use crate::dispatch::workers::Pool;
use crate::dispatch::{background, sync};

use self::inflight::InFlight;

/// State shared read-mostly between the caller threads and the workers.
pub struct Shared {
    pub cfg: CoreCfg,
    pub transport: Box<dyn Transport>,
    pub inflight: Arc<InFlight>,
}

pub struct Core {
    shared: Arc<Shared>,
    pool: Pool,
}

impl Core {
    /// Build a core around an explicit transport.
    pub fn new(cfg: CoreCfg, transport: Box<dyn Transport>) -> CoreResult<Self> {
        let pool = Pool::new(cfg.workers, "bridge-core-worker")?;
        log::info!(
            target: "bridge_core::handle",
            "core created with {} endpoint(s) and {} worker(s)",
            cfg.endpoints.len(),
            pool.size()
        );

        Ok(Self {
            shared: Arc::new(Shared {
                cfg,
                transport,
                inflight: Arc::new(InFlight::new()),
            }),
            pool,
        })
    }

    /// Build a core talking HTTP to the given endpoints.
    pub fn from_urls<S: AsRef<str>>(urls: &[S]) -> CoreResult<Self> {
        let cfg = CoreCfg::from_urls(urls)?;
        crate::common::log::init(cfg.log_level);
        let transport = UreqTransport::new(cfg.timeout);
        Self::new(cfg, Box::new(transport))
    }

    pub fn config(&self) -> &CoreCfg {
        &self.shared.cfg
    }

    /// Run a request on the calling thread.
    pub fn call(&self, input: &[u8]) -> OwnedBuffer {
        sync::dispatch(&self.shared, input)
    }

    /// Queue a request; `callback` fires exactly once from a worker thread.
    pub fn call_async(&self, input: Vec<u8>, callback: Callback) {
        background::dispatch(&self.shared, &self.pool, input, callback);
    }

    /// Asynchronous calls accepted and not yet delivered.
    pub fn outstanding(&self) -> usize {
        self.shared.inflight.outstanding()
    }

    /// Refuse new asynchronous calls, wait for outstanding callbacks, stop the workers.
    pub fn shutdown(&mut self) {
        let inside = background::running_inside(&self.shared);
        self.shared.inflight.close();
        if inside {
            // Our own worker is busy here; queued calls would never be picked up.
            let ran = self.pool.run_queued();
            if ran > 0 {
                log::debug!(
                    target: "bridge_core::handle",
                    "ran {ran} queued call(s) during shutdown"
                );
            }
        }
        self.shared.inflight.drain(usize::from(inside));
        self.pool.shutdown();
        log::info!(target: "bridge_core::handle", "core shut down");
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicPtr, Ordering};
    use std::time::Duration;

    use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

    use crate::api::types::ByteBuffer;
    use crate::client::HttpRequest;
    use crate::request::TextResponse;

    struct Offline;

    impl Transport for Offline {
        fn send(&self, _request: &HttpRequest) -> CoreResult<Vec<u8>> {
            Err(crate::common::error::CoreError::transport("offline"))
        }
    }

    struct Exploding;

    impl Transport for Exploding {
        fn send(&self, _request: &HttpRequest) -> CoreResult<Vec<u8>> {
            panic!("transport exploded")
        }
    }

    /// Answers once the test releases it, keeping the worker busy until then.
    struct Gate(Receiver<()>);

    impl Transport for Gate {
        fn send(&self, _request: &HttpRequest) -> CoreResult<Vec<u8>> {
            let _ = self.0.recv();
            Ok(b"gated".to_vec())
        }
    }

    fn cfg(workers: usize) -> CoreCfg {
        let mut cfg = CoreCfg::from_urls(&["https://node.example"]).unwrap();
        cfg.workers = workers;
        cfg
    }

    fn core() -> Core {
        Core::new(cfg(2), Box::new(Offline)).unwrap()
    }

    type Outcome = Result<Vec<u8>, String>;

    /// Callback context recording every delivery; may destroy a core on the first one.
    struct Inbox {
        tx: Sender<Outcome>,
        rx: Receiver<Outcome>,
        destroy: AtomicPtr<Core>,
    }

    impl Inbox {
        fn new() -> Self {
            let (tx, rx) = unbounded();
            Self {
                tx,
                rx,
                destroy: AtomicPtr::new(std::ptr::null_mut()),
            }
        }

        fn callback(&self) -> Callback {
            Callback {
                context: self as *const Inbox as *const c_void,
                callback: Some(deliver),
            }
        }

        fn next(&self) -> Outcome {
            self.rx
                .recv_timeout(Duration::from_secs(10))
                .expect("callback did not fire in time")
        }
    }

    extern "C" fn deliver(context: *const c_void, result: ByteBuffer) {
        let inbox = unsafe { &*(context as *const Inbox) };
        let outcome = match unsafe { result.reclaim() } {
            Ok(OwnedBuffer::Data(bytes)) => Ok(bytes),
            Ok(OwnedBuffer::Error(msg)) => Err(msg.to_string_lossy().into_owned()),
            Err(_) => Err("unknown buffer".to_string()),
        };
        let core = inbox.destroy.swap(std::ptr::null_mut(), Ordering::SeqCst);
        if !core.is_null() {
            drop(unsafe { Box::from_raw(core) });
        }
        let _ = inbox.tx.send(outcome);
    }

    #[test]
    fn sync_call_answers_inline() {
        let core = core();
        let out = core.call(br#"{"op":"greeting","verb":"Hi","name":"there"}"#);
        let text: TextResponse = serde_json::from_slice(out.payload().unwrap()).unwrap();
        assert_eq!(text.text, "Hi, there!");
    }

    #[test]
    fn sync_call_reports_transport_failures() {
        let core = core();
        let out = core.call(br#"{"op":"fetch","path":"/"}"#);
        assert_eq!(out.error_message(), Some("transport error: offline"));
    }

    #[test]
    fn shutdown_twice_is_harmless() {
        let mut core = core();
        core.shutdown();
        core.shutdown();
        assert_eq!(core.outstanding(), 0);
    }

    #[test]
    fn panics_become_internal_errors_on_both_paths() {
        let mut core = Core::new(cfg(2), Box::new(Exploding)).unwrap();
        let expected = "internal error: call panicked: transport exploded";

        let out = core.call(br#"{"op":"fetch","path":"/"}"#);
        assert_eq!(out.error_message(), Some(expected));

        let inbox = Inbox::new();
        core.call_async(br#"{"op":"fetch","path":"/"}"#.to_vec(), inbox.callback());
        assert_eq!(inbox.next(), Err(expected.to_string()));

        core.shutdown();
        assert!(inbox.rx.try_recv().is_err());
        assert_eq!(core.outstanding(), 0);
    }

    #[test]
    fn shutdown_inside_callback_runs_queued_calls() {
        let (release_tx, release_rx) = bounded::<()>(1);
        let core = Box::into_raw(Box::new(
            Core::new(cfg(1), Box::new(Gate(release_rx))).unwrap(),
        ));
        let inbox = Inbox::new();

        {
            let live = unsafe { &*core };
            // The gated fetch holds the only worker; the greeting waits in the queue.
            live.call_async(br#"{"op":"fetch","path":"/"}"#.to_vec(), inbox.callback());
            live.call_async(
                br#"{"op":"greeting","verb":"Hi","name":"queued"}"#.to_vec(),
                inbox.callback(),
            );
            assert_eq!(live.outstanding(), 2);
        }
        inbox.destroy.store(core, Ordering::SeqCst);
        release_tx.send(()).unwrap();

        let mut seen = vec![inbox.next().unwrap(), inbox.next().unwrap()];
        seen.sort();
        let greeting: TextResponse = serde_json::from_slice(&seen[1]).unwrap();
        assert_eq!(seen[0], b"gated".to_vec());
        assert_eq!(greeting.text, "Hi, queued!");
        assert!(inbox.destroy.load(Ordering::SeqCst).is_null());
        assert!(inbox.rx.try_recv().is_err());
    }

    #[test]
    fn from_urls_rejects_bad_config() {
        assert!(Core::from_urls(&["not a url"]).is_err());
    }
}
