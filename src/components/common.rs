use base64::{engine::general_purpose::STANDARD, Engine as _};
use dioxus::prelude::*;
use serde::Deserialize;
use std::time::Duration;

use crate::backend::upload::FileSelection;
use crate::backend::{sleep, Notification, NotificationLevel};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// `0 Bytes`, `500 Bytes`, `1.5 KB`, `2 MB`: at most two decimals, trailing
/// zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// `0x1234...abcd`
pub fn short_address(address: &str) -> String {
    match (address.get(..6), address.len().checked_sub(4).and_then(|start| address.get(start..))) {
        (Some(head), Some(tail)) if address.len() > 10 => format!("{}...{}", head, tail),
        _ => address.to_string(),
    }
}

// One delegated `change` listener on `document` serves every picker, so an
// input that is unmounted and rendered again keeps working. Each hook call
// replaces the handler for its id. Files over `__MAX_BYTES__` are reported
// by size only and never read.
const FILE_READER_JS: &str = r#"
    const readers = (window.__fileReaders = window.__fileReaders || {});
    if (!window.__fileReadersBound) {
        window.__fileReadersBound = true;
        document.addEventListener("change", (e) => {
            const input = e.target;
            const handler = input && input.id && readers[input.id];
            if (handler && input.files) handler(input);
        });
    }
    readers["__INPUT_ID__"] = (input) => {
        const file = input.files[0];
        if (!file) return;
        const meta = { name: file.name, mime: file.type, size: file.size };
        if (file.size > __MAX_BYTES__) {
            dioxus.send(meta);
            input.value = "";
            return;
        }
        const reader = new FileReader();
        reader.onload = (evt) => {
            const data = evt.target.result.split(",")[1] || "";
            dioxus.send({ ...meta, data: data });
            input.value = "";
        };
        reader.readAsDataURL(file);
    };
"#;

fn file_reader_script(input_id: &str, max_bytes: u64) -> String {
    FILE_READER_JS.replace("__INPUT_ID__", input_id).replace("__MAX_BYTES__", &max_bytes.to_string())
}

#[derive(Debug, Deserialize)]
struct PickedFile {
    name: String,
    #[serde(default)]
    mime: String,
    #[serde(default)]
    size: u64,
    data: Option<String>,
}

fn selection_from_message(message: serde_json::Value) -> Option<FileSelection> {
    let picked: PickedFile = serde_json::from_value(message).ok()?;
    let Some(data) = picked.data else {
        return Some(FileSelection::unread(picked.name, picked.mime, picked.size));
    };
    let bytes = STANDARD.decode(data).ok()?;
    let mut file = FileSelection::new(picked.name, picked.mime, bytes);
    file.reported_size = file.reported_size.max(picked.size);
    Some(file)
}

/// Hands whatever file the user picks in the `<input type=file>` with id
/// `input_id` to `on_pick`. Files larger than `max_bytes` arrive unread.
pub fn use_file_reader(input_id: &'static str, max_bytes: u64, on_pick: Callback<FileSelection>) {
    use_effect(move || {
        let mut eval = document::eval(&file_reader_script(input_id, max_bytes));
        spawn(async move {
            while let Ok(message) = eval.recv::<serde_json::Value>().await {
                match selection_from_message(message) {
                    Some(file) => {
                        tracing::debug!(name = %file.name, size = file.size(), read = !file.bytes.is_empty(), "file picked");
                        on_pick.call(file);
                    }
                    None => tracing::warn!(input = input_id, "could not read picked file"),
                }
            }
        });
    });
}

pub fn copy_to_clipboard(text: &str) {
    let literal = serde_json::to_string(text).unwrap_or_default();
    let _ = document::eval(&format!("navigator.clipboard.writeText({});", literal));
}

#[component]
pub fn Toaster(notifications: Vec<Notification>, ttl_ms: u64, on_dismiss: EventHandler<u64>) -> Element {
    rsx! {
        div { class: "toaster",
            for notification in notifications {
                Toast { key: "{notification.id}", notification: notification.clone(), ttl_ms, on_dismiss }
            }
        }
    }
}

#[component]
fn Toast(notification: Notification, ttl_ms: u64, on_dismiss: EventHandler<u64>) -> Element {
    let id = notification.id;
    use_future(move || async move {
        sleep(Duration::from_millis(ttl_ms)).await;
        on_dismiss.call(id);
    });

    let level_class = match notification.level {
        NotificationLevel::Info => "toast-info",
        NotificationLevel::Error => "toast-error",
    };
    let time = notification.created_at.format("%H:%M:%S").to_string();

    rsx! {
        div { class: "toast {level_class} animate-fade-in",
            div { class: "toast-body",
                div { class: "toast-title", "{notification.title}" }
                if !notification.description.is_empty() {
                    div { class: "toast-description", "{notification.description}" }
                }
                div { class: "toast-time", "{time}" }
            }
            button {
                class: "toast-close",
                onclick: move |_| on_dismiss.call(id),
                "✕"
            }
        }
    }
}
