use dioxus::prelude::*;

use crate::backend::{AppCmd, AuthAction};
use crate::components::forms::{validate_signup, Field, FormErrors};
use crate::components::login_page::use_auth_redirect;
use crate::components::use_app;
use crate::Route;

#[component]
pub fn SignupComponent() -> Element {
    let app = use_app();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut confirm = use_signal(String::new);
    let mut errors = use_signal(FormErrors::default);
    let mut awaiting = use_signal(|| false);

    use_auth_redirect(AuthAction::Signup, awaiting);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let found = validate_signup(&email(), &password(), &confirm());
        if !found.is_empty() {
            errors.set(found);
            return;
        }
        awaiting.set(true);
        app.send(AppCmd::Signup { email: email(), password: password() });
    };

    let current = errors.read().clone();
    let input_class = |field: Field| if current.get(field).is_some() { "input input-error" } else { "input" };

    rsx! {
        div { class: "page-container auth-page animate-fade-in",
            div { class: "panel auth-card",
                div { class: "panel-header text-center",
                    h2 { class: "panel-title text-accent", "Join StorageX" }
                    p { class: "text-muted", "Create your decentralized storage account" }
                }
                form { class: "form", onsubmit: on_submit,
                    div { class: "form-field",
                        label { r#for: "email", "Email" }
                        input {
                            id: "email",
                            r#type: "email",
                            class: input_class(Field::Email),
                            placeholder: "Enter your email",
                            value: "{email}",
                            oninput: move |evt| {
                                email.set(evt.value());
                                errors.write().clear(Field::Email);
                            },
                        }
                        if let Some(message) = current.get(Field::Email) {
                            p { class: "field-error", "{message}" }
                        }
                    }
                    div { class: "form-field",
                        label { r#for: "password", "Password" }
                        input {
                            id: "password",
                            r#type: "password",
                            class: input_class(Field::Password),
                            placeholder: "Create a password",
                            value: "{password}",
                            oninput: move |evt| {
                                password.set(evt.value());
                                errors.write().clear(Field::Password);
                            },
                        }
                        if let Some(message) = current.get(Field::Password) {
                            p { class: "field-error", "{message}" }
                        }
                    }
                    div { class: "form-field",
                        label { r#for: "confirm-password", "Confirm Password" }
                        input {
                            id: "confirm-password",
                            r#type: "password",
                            class: input_class(Field::ConfirmPassword),
                            placeholder: "Confirm your password",
                            value: "{confirm}",
                            oninput: move |evt| {
                                confirm.set(evt.value());
                                errors.write().clear(Field::ConfirmPassword);
                            },
                        }
                        if let Some(message) = current.get(Field::ConfirmPassword) {
                            p { class: "field-error", "{message}" }
                        }
                    }
                    button {
                        r#type: "submit",
                        class: "btn btn-primary w-full",
                        disabled: awaiting(),
                        if awaiting() { "Creating account..." } else { "Create Account" }
                    }
                }
                p { class: "text-muted text-center mt-4",
                    "Already have an account? "
                    Link { to: Route::LoginComponent {}, class: "text-accent", "Sign in" }
                }
            }
        }
    }
}
