//! Helpers shared by the boundary tests: a tiny HTTP service standing in for
//! the node, plus host-side wrappers around the C entrypoints.
#![allow(dead_code)]

use std::ffi::{c_void, CStr, CString};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, ThreadId};
use std::time::Duration;

use bridge_core::{bridge_core_create, bridge_free_data, ByteBuffer, Callback, Core};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Fake collaborating service bound to an ephemeral loopback port.
pub struct FakeNode {
    pub url: String,
}

impl FakeNode {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                thread::spawn(move || serve(stream));
            }
        });
        Self { url }
    }
}

fn serve(stream: TcpStream) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).is_err() || header == "\r\n" || header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0u8; content_length];
    let _ = reader.read_exact(&mut body);

    let (status, payload) = route(&method, &target, body);
    let reason = if status == 200 { "OK" } else { "Error" };
    let head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        payload.len()
    );
    let mut stream = stream;
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&payload);
    let _ = stream.flush();
}

fn route(method: &str, target: &str, body: Vec<u8>) -> (u16, Vec<u8>) {
    match (method, target) {
        ("POST", "/echo") => (200, body),
        ("GET", t) if t.starts_with("/accounts/") => {
            let address = &t["/accounts/".len()..];
            let json = format!(r#"{{"sequence_number":"0","authentication_key":"{address}"}}"#);
            (200, json.into_bytes())
        }
        ("GET", "/slow") => {
            thread::sleep(Duration::from_millis(150));
            (200, br#"{"slow":true}"#.to_vec())
        }
        ("POST", t) if t.starts_with("/mint?") => (200, br#"["0xfeed"]"#.to_vec()),
        _ => (
            404,
            br#"{"code":"not_found","message":"resource not found"}"#.to_vec(),
        ),
    }
}

/// Create a core for `urls` through the C entrypoint.
pub fn create(urls: &[&str]) -> *mut Core {
    let owned: Vec<CString> = urls.iter().map(|u| CString::new(*u).unwrap()).collect();
    let ptrs: Vec<*const std::ffi::c_char> = owned.iter().map(|c| c.as_ptr()).collect();
    unsafe { bridge_core_create(ptrs.as_ptr(), ptrs.len()) }
}

/// Copy a returned buffer into host memory and free it, as a host would.
pub fn take(buffer: ByteBuffer) -> Result<Vec<u8>, String> {
    let out = unsafe {
        if buffer.err.is_null() {
            assert!(!buffer.ptr.is_null());
            assert!(buffer.len <= buffer.cap);
            Ok(std::slice::from_raw_parts(buffer.ptr, buffer.len).to_vec())
        } else {
            Err(CStr::from_ptr(buffer.err).to_string_lossy().into_owned())
        }
    };
    unsafe { bridge_free_data(buffer) };
    out
}

pub fn text_of(payload: &[u8]) -> String {
    let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
    value["text"].as_str().unwrap().to_string()
}

/// One callback invocation observed by the host side.
#[derive(Debug)]
pub struct Delivery {
    pub result: Result<Vec<u8>, String>,
    pub thread: ThreadId,
}

/// Host-side callback context collecting every delivery.
pub struct Collector {
    tx: Sender<Delivery>,
    pub rx: Receiver<Delivery>,
    /// When set, the first callback destroys this core from inside the callback.
    pub destroy_on_fire: std::sync::atomic::AtomicPtr<Core>,
}

impl Collector {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            destroy_on_fire: std::sync::atomic::AtomicPtr::new(std::ptr::null_mut()),
        }
    }

    pub fn callback(&self) -> Callback {
        Callback {
            context: self as *const Collector as *const c_void,
            callback: Some(on_result),
        }
    }

    pub fn wait(&self) -> Delivery {
        self.rx
            .recv_timeout(Duration::from_secs(10))
            .expect("callback did not fire in time")
    }
}

extern "C" fn on_result(context: *const c_void, result: ByteBuffer) {
    let collector = unsafe { &*(context as *const Collector) };
    let result = take(result);

    let core = collector
        .destroy_on_fire
        .swap(std::ptr::null_mut(), std::sync::atomic::Ordering::SeqCst);
    if !core.is_null() {
        unsafe { bridge_core::bridge_core_destroy(core) };
    }

    let _ = collector.tx.send(Delivery {
        result,
        thread: thread::current().id(),
    });
}
