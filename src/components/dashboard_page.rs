use dioxus::prelude::*;

use crate::backend::upload::{FileSelection, UploadPhase, UploadedFile};
use crate::backend::{AppCmd, NotificationLevel};
use crate::components::common::{copy_to_clipboard, format_file_size, short_address, use_file_reader};
use crate::components::use_app;
use crate::Route;

const UPLOAD_INPUT_ID: &str = "file-upload";

#[component]
pub fn DashboardComponent() -> Element {
    let app = use_app();
    let state = app.state;

    let app_pick = app.clone();
    let limit = app.config.upload.max_file_bytes;
    use_file_reader(UPLOAD_INPUT_ID, limit, use_callback(move |file: FileSelection| app_pick.send(AppCmd::Upload(file))));

    let Some(user) = state.user.read().clone() else {
        return rsx! {
            div { class: "page-container py-8 animate-fade-in",
                div { class: "panel empty-state",
                    div { class: "empty-state-icon", "🔒" }
                    p { class: "empty-state-title", "Please log in to access your dashboard." }
                    Link { to: Route::LoginComponent {}, class: "btn btn-primary", "Sign In" }
                }
            }
        };
    };

    let phase = *state.upload_phase.read();
    let progress = *state.upload_progress.read();
    let uploading = matches!(phase, UploadPhase::Validating | UploadPhase::Uploading);
    let files = state.files.read().clone();
    let previews = state.previews.read().clone();
    let wallet = state.wallet.read().clone();
    let max_mib = app.config.upload.max_file_bytes / (1024 * 1024);

    let app_copy = app.clone();
    let on_copy = move |hash: String| {
        copy_to_clipboard(&hash);
        app_copy.send(AppCmd::Notify {
            title: "Copied to clipboard".to_string(),
            description: "IPFS hash has been copied".to_string(),
            level: NotificationLevel::Info,
        });
    };

    let app_preview = app.clone();
    let on_preview = move |hash: String| app_preview.send(AppCmd::FetchPreview { hash });

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Dashboard" }
                p { class: "text-muted", "Manage your decentralized storage files" }
            }

            div { class: "dashboard-grid",
                div { class: "dashboard-main",
                    div { class: "panel",
                        div { class: "panel-header",
                            h2 { class: "panel-title", "Upload to IPFS" }
                        }
                        div { class: "form-field",
                            label { r#for: UPLOAD_INPUT_ID, "Select File" }
                            input { id: UPLOAD_INPUT_ID, r#type: "file", class: "input", disabled: uploading }
                            p { class: "text-muted text-sm", "Maximum file size: {max_mib}MB" }
                        }
                        if uploading || phase == UploadPhase::Completed {
                            div { class: "upload-progress",
                                div { class: "flex justify-between text-sm",
                                    span {
                                        if phase == UploadPhase::Completed { "Upload complete" } else { "Uploading to IPFS..." }
                                    }
                                    span { "{progress}%" }
                                }
                                div { class: "progress-track",
                                    div { class: "progress-bar", style: "width: {progress}%" }
                                }
                            }
                        }
                    }

                    div { class: "panel",
                        div { class: "panel-header",
                            h2 { class: "panel-title", "Your Files ({files.len()})" }
                        }
                        if files.is_empty() {
                            p { class: "text-muted text-center",
                                "No files uploaded yet. Upload your first file to get started!"
                            }
                        } else {
                            div { class: "file-list",
                                // Same content uploaded twice shares a hash; key on upload order.
                                for (seq, file) in files.iter().rev().enumerate().rev() {
                                    FileRow {
                                        key: "{seq}",
                                        file: file.clone(),
                                        preview: previews.get(&file.hash).cloned(),
                                        on_copy: on_copy.clone(),
                                        on_preview: on_preview.clone(),
                                    }
                                }
                            }
                        }
                    }
                }

                div { class: "dashboard-side",
                    div { class: "panel",
                        div { class: "panel-header",
                            h2 { class: "panel-title", "Account Status" }
                        }
                        div { class: "status-item",
                            label { "Email" }
                            p { "{user.email}" }
                        }
                        div { class: "status-item",
                            label { "Wallet Status" }
                            div { class: "flex items-center gap-2",
                                span { class: if wallet.is_connected() { "status-dot status-dot-on" } else { "status-dot status-dot-off" } }
                                p { if wallet.is_connected() { "Connected" } else { "Disconnected" } }
                            }
                        }
                        if let Some(address) = wallet.address() {
                            div { class: "status-item",
                                label { "Wallet Address" }
                                p { class: "font-mono", "{short_address(address)}" }
                            }
                        }
                        if let Some(chain_id) = wallet.chain_id() {
                            div { class: "status-item",
                                label { "Chain" }
                                p { class: "font-mono", "{chain_id}" }
                            }
                        }
                        div { class: "status-item",
                            label { "Files Stored" }
                            p { class: "text-accent text-2xl", "{files.len()}" }
                        }
                    }

                    div { class: "panel",
                        div { class: "panel-header",
                            h2 { class: "panel-title", "IPFS Network" }
                        }
                        div { class: "flex items-center gap-2",
                            span { class: "status-dot status-dot-on" }
                            p { "Connected to IPFS" }
                        }
                        p { class: "text-muted text-sm", "Files are distributed across the InterPlanetary File System" }
                    }
                }
            }
        }
    }
}

#[component]
fn FileRow(
    file: UploadedFile,
    preview: Option<String>,
    on_copy: EventHandler<String>,
    on_preview: EventHandler<String>,
) -> Element {
    let mut show_preview = use_signal(|| false);
    let hash_copy = file.hash.clone();
    let hash_preview = file.hash.clone();

    rsx! {
        div { class: "file-row",
            div { class: "file-info",
                h4 { class: "file-name", "{file.name}" }
                p { class: "text-muted text-sm", "Size: {format_file_size(file.size)}" }
                p { class: "text-muted text-xs font-mono break-all", "Hash: {file.hash}" }
            }
            div { class: "file-actions",
                button {
                    class: "btn btn-outline btn-sm",
                    onclick: move |_| on_copy.call(hash_copy.clone()),
                    "Copy Hash"
                }
                a { class: "btn btn-outline btn-sm", href: "{file.url}", target: "_blank", rel: "noopener", "View" }
                button {
                    class: "btn btn-outline btn-sm",
                    onclick: move |_| {
                        let open = !show_preview();
                        show_preview.set(open);
                        if open {
                            on_preview.call(hash_preview.clone());
                        }
                    },
                    if show_preview() { "Hide" } else { "Preview" }
                }
            }
            if show_preview() {
                match preview {
                    Some(text) => rsx! { pre { class: "file-preview", "{text}" } },
                    None => rsx! { p { class: "text-muted text-sm", "Loading preview..." } },
                }
            }
        }
    }
}
