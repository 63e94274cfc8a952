//! The LSP transport loop (§5): one thread owns stdin and dispatches
//! notifications inline, in arrival order; requests are handed to a bounded
//! worker pool so a slow hover/completion lookup on one document can't
//! stall diagnostics for another. `$/cancelRequest` marks a request id as
//! cancelled; a worker that picks up a cancelled id short-circuits with the
//! LSP "request cancelled" error instead of running the handler.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use crossbeam_channel::{bounded, Sender};
use dashmap::DashSet;
use serde_json::Value;

use crate::semantic_index::java_resolver::JavaClassResolver;
use crate::semantic_index::lsp::handlers;
use crate::semantic_index::lsp::transport::{read_message, FramedWriter};
use crate::semantic_index::DocumentIndex;

const WORKER_COUNT: usize = 4;
const REQUEST_CANCELLED: i32 = -32800;

pub struct LspServer {
    pub index: Arc<DocumentIndex>,
    /// Rebuilt once, from `initialize`'s `initializationOptions.classpath` —
    /// the server starts with an empty classpath since the classpath isn't
    /// known until the client's first request arrives.
    resolver: RwLock<Arc<JavaClassResolver>>,
    cancelled: DashSet<String>,
    shutdown_requested: AtomicBool,
}

impl LspServer {
    pub fn resolver(&self) -> Arc<JavaClassResolver> {
        self.resolver.read().unwrap().clone()
    }

    pub fn configure_classpath(&self, classpath: Vec<PathBuf>) {
        *self.resolver.write().unwrap() = Arc::new(JavaClassResolver::new(classpath));
    }
}

struct WorkItem {
    id: Value,
    method: String,
    params: Value,
}

pub fn run(stdin: impl BufRead, stdout: impl Write + Send + 'static) -> std::io::Result<()> {
    let writer = Arc::new(FramedWriter::new(stdout));
    let server = Arc::new(LspServer {
        index: DocumentIndex::new(),
        resolver: RwLock::new(Arc::new(JavaClassResolver::new(Vec::new()))),
        cancelled: DashSet::new(),
        shutdown_requested: AtomicBool::new(false),
    });

    let publish_writer = writer.clone();
    let publish_index = server.index.clone();
    server.index.set_reanalysis_hook(move |uri| {
        let diagnostics = handlers::diagnostics_to_lsp(&publish_index, uri);
        let _ = publish_writer.write_message(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": "textDocument/publishDiagnostics",
            "params": { "uri": uri, "diagnostics": diagnostics },
        }));
    });

    let (tx, rx) = bounded::<WorkItem>(256);
    for _ in 0..WORKER_COUNT {
        let rx = rx.clone();
        let server = server.clone();
        let writer = writer.clone();
        thread::spawn(move || worker_loop(rx, server, writer));
    }

    run_transport_loop(stdin, &server, &tx, &writer)
}

fn run_transport_loop(mut stdin: impl BufRead, server: &Arc<LspServer>, tx: &Sender<WorkItem>, writer: &Arc<FramedWriter<impl Write>>) -> std::io::Result<()> {
    loop {
        let Some(message) = read_message(&mut stdin)? else { return Ok(()) };
        let Some(method) = message.get("method").and_then(Value::as_str) else { continue };
        let params = message.get("params").cloned().unwrap_or(Value::Null);

        match message.get("id") {
            None => handle_notification(server, method, params),
            Some(id) => {
                let _ = tx.send(WorkItem { id: id.clone(), method: method.to_string(), params });
            }
        }

        if method == "exit" {
            let code = if server.shutdown_requested.load(Ordering::SeqCst) { 0 } else { 1 };
            std::process::exit(code);
        }
    }
}

fn handle_notification(server: &Arc<LspServer>, method: &str, params: Value) {
    match method {
        "textDocument/didOpen" => handlers::did_open(server, params),
        "textDocument/didChange" => handlers::did_change(server, params),
        "textDocument/didClose" => handlers::did_close(server, params),
        "$/cancelRequest" => {
            if let Some(id) = params.get("id") {
                server.cancelled.insert(id.to_string());
            }
        }
        _ => {}
    }
}

fn worker_loop(rx: crossbeam_channel::Receiver<WorkItem>, server: Arc<LspServer>, writer: Arc<FramedWriter<impl Write>>) {
    while let Ok(item) = rx.recv() {
        let id_key = item.id.to_string();
        if server.cancelled.remove(&id_key).is_some() {
            let _ = writer.write_message(&error_response(&item.id, REQUEST_CANCELLED, "request cancelled"));
            continue;
        }
        if item.method == "shutdown" {
            server.shutdown_requested.store(true, Ordering::SeqCst);
            let _ = writer.write_message(&success_response(&item.id, Value::Null));
            continue;
        }
        let result = handlers::dispatch(&server, &item.method, item.params);
        let response = match result {
            Ok(value) => success_response(&item.id, value),
            Err((code, message)) => error_response(&item.id, code, &message),
        };
        let _ = writer.write_message(&response);
    }
}

fn success_response(id: &Value, result: Value) -> Value {
    serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: &Value, code: i32, message: &str) -> Value {
    serde_json::json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}
