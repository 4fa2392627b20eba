use dioxus::prelude::*;

use crate::backend::upload::FileSelection;
use crate::backend::AppCmd;
use crate::components::common::{short_address, use_file_reader};
use crate::components::use_app;

const PHOTO_INPUT_ID: &str = "profile-upload";

#[component]
pub fn ProfileComponent() -> Element {
    let app = use_app();
    let state = app.state;

    let app_pick = app.clone();
    let limit = app.config.upload.max_photo_bytes;
    use_file_reader(PHOTO_INPUT_ID, limit, use_callback(move |file: FileSelection| app_pick.send(AppCmd::SetProfilePhoto(file))));

    let mut name = use_signal(String::new);
    let mut email = use_signal(String::new);
    let mut is_editing = use_signal(|| false);

    let wallet = state.wallet.read().clone();
    let Some(address) = wallet.address().map(short_address) else {
        return rsx! {
            div { class: "page-container py-8 animate-fade-in",
                div { class: "panel empty-state",
                    div { class: "empty-state-icon", "👛" }
                    p { class: "empty-state-title", "Please connect your wallet to access your profile." }
                }
            }
        };
    };

    let profile = state.profile.read().clone();
    let editing = is_editing();
    let initial = profile.name.chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_else(|| "?".to_string());

    let name_value = if editing { name() } else { profile.name.clone() };
    let email_value = if editing { email() } else { profile.email.clone() };

    let on_edit = move |_| {
        let current = state.profile.peek().clone();
        name.set(current.name);
        email.set(current.email);
        is_editing.set(true);
    };

    let on_save = move |_| {
        app.send(AppCmd::UpdateProfile { name: name(), email: email() });
        is_editing.set(false);
    };

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "page-header",
                h1 { class: "page-title", "Profile" }
                p { class: "text-muted", "Manage your account information" }
            }

            div { class: "profile-grid",
                div { class: "panel",
                    div { class: "panel-header",
                        h2 { class: "panel-title", "Profile Photo" }
                    }
                    div { class: "avatar avatar-lg",
                        if let Some(image) = &profile.image {
                            img { src: "{image}", alt: "Profile", class: "w-full h-full object-cover" }
                        } else {
                            span { class: "avatar-fallback", "{initial}" }
                        }
                    }
                    label { class: "btn btn-outline", r#for: PHOTO_INPUT_ID,
                        if profile.image.is_some() { "Change Photo" } else { "Upload Photo" }
                    }
                    input { id: PHOTO_INPUT_ID, r#type: "file", accept: "image/*", class: "hidden" }
                }

                div { class: "panel",
                    div { class: "panel-header",
                        h2 { class: "panel-title", "Profile Information" }
                    }
                    div { class: "form-field",
                        label { "Wallet Address" }
                        input { class: "input font-mono", readonly: true, value: "{address}" }
                    }
                    div { class: "form-field",
                        label { r#for: "profile-name", "Full Name" }
                        input {
                            id: "profile-name",
                            class: "input",
                            placeholder: "Enter your full name",
                            disabled: !editing,
                            value: "{name_value}",
                            oninput: move |evt| name.set(evt.value()),
                        }
                    }
                    div { class: "form-field",
                        label { r#for: "profile-email", "Email Address" }
                        input {
                            id: "profile-email",
                            r#type: "email",
                            class: "input",
                            placeholder: "Enter your email address",
                            disabled: !editing,
                            value: "{email_value}",
                            oninput: move |evt| email.set(evt.value()),
                        }
                    }
                    div { class: "flex gap-2",
                        if editing {
                            button { class: "btn btn-primary", onclick: on_save, "Save Changes" }
                            button { class: "btn btn-outline", onclick: move |_| is_editing.set(false), "Cancel" }
                        } else {
                            button { class: "btn btn-primary", onclick: on_edit, "Update Details" }
                        }
                    }
                }
            }
        }
    }
}
