#![allow(dead_code)]

use std::io::Write;

use mockasm_debugger::{handle, DebuggerConfig, Request, Response, SessionStore};
use tempfile::NamedTempFile;

/// Writes `code` to a temporary `.asm` file that lives as long as the handle.
pub fn program_file(code: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".asm")
        .tempfile()
        .expect("temporary file");
    file.write_all(code.as_bytes()).expect("write program");
    file
}

pub fn path_of(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().into_owned()
}

/// Sends one JSON request line and returns the JSON response.
pub fn request(store: &SessionStore, json: &str) -> serde_json::Value {
    let request: Request = serde_json::from_str(json).expect("valid request");
    let response: Response = handle(store, &DebuggerConfig::default(), request);
    serde_json::to_value(response).expect("serializable response")
}

pub fn get_output(store: &SessionStore, session: &str, path: &str) -> serde_json::Value {
    request(
        store,
        &serde_json::json!({"op": "get-output", "session": session, "path": path}).to_string(),
    )
}

pub fn next_output(store: &SessionStore, session: &str) -> serde_json::Value {
    request(
        store,
        &serde_json::json!({"op": "next-output", "session": session}).to_string(),
    )
}
