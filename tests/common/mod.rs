#![allow(dead_code)]

use ruby_insight::{FileId, Settings, Workspace};

pub const URI: &str = "file:///fake.rb";

pub fn workspace() -> Workspace {
    Workspace::new(Settings::default()).expect("workspace should start")
}

/// Opens `source` as `file:///fake.rb` in a fresh workspace.
pub fn open(source: &str) -> (Workspace, FileId) {
    let ws = workspace();
    let file_id = ws.open(URI, source).expect("source should open");
    (ws, file_id)
}

/// Hover content at a zero-based position of a freshly opened `source`.
pub fn hover(source: &str, line: u32, column: u16) -> Option<String> {
    let (ws, file_id) = open(source);
    hover_in(&ws, file_id, line, column)
}

pub fn hover_in(ws: &Workspace, file_id: FileId, line: u32, column: u16) -> Option<String> {
    ws.resolve_at(file_id, line, column)
        .expect("file should be open")
}

/// Like `hover`, but fails the test when nothing is returned.
pub fn hover_contents(source: &str, line: u32, column: u16) -> String {
    hover(source, line, column)
        .unwrap_or_else(|| panic!("expected hover content at {line}:{column}"))
}
