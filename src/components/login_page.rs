use dioxus::prelude::*;

use crate::backend::{AppCmd, AuthAction};
use crate::components::forms::{validate_login, Field, FormErrors};
use crate::components::use_app;
use crate::Route;

/// Navigates to the dashboard once the backend answers the request this
/// page sent. `awaiting` is set when the request goes out.
pub fn use_auth_redirect(action: AuthAction, mut awaiting: Signal<bool>) {
    let app = use_app();
    let navigator = use_navigator();
    let outcome = app.state.auth_outcome;

    use_effect(move || {
        let Some((finished, success)) = *outcome.read() else {
            return;
        };
        if finished != action || !*awaiting.peek() {
            return;
        }
        awaiting.set(false);
        if success {
            navigator.push(Route::DashboardComponent {});
        }
    });
}

#[component]
pub fn LoginComponent() -> Element {
    let app = use_app();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut errors = use_signal(FormErrors::default);
    let mut awaiting = use_signal(|| false);

    use_auth_redirect(AuthAction::Login, awaiting);

    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let found = validate_login(&email(), &password());
        if !found.is_empty() {
            errors.set(found);
            return;
        }
        awaiting.set(true);
        app.send(AppCmd::Login { email: email(), password: password() });
    };

    let current = errors.read().clone();

    rsx! {
        div { class: "page-container auth-page animate-fade-in",
            div { class: "panel auth-card",
                div { class: "panel-header text-center",
                    h2 { class: "panel-title text-accent", "Welcome Back" }
                    p { class: "text-muted", "Sign in to your StorageX account" }
                }
                form { class: "form", onsubmit: on_submit,
                    div { class: "form-field",
                        label { r#for: "email", "Email" }
                        input {
                            id: "email",
                            r#type: "email",
                            class: if current.get(Field::Email).is_some() { "input input-error" } else { "input" },
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
                            class: if current.get(Field::Password).is_some() { "input input-error" } else { "input" },
                            placeholder: "Enter your password",
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
                    button {
                        r#type: "submit",
                        class: "btn btn-primary w-full",
                        disabled: awaiting(),
                        if awaiting() { "Signing in..." } else { "Sign In" }
                    }
                }
                p { class: "text-muted text-center mt-4",
                    "Don't have an account? "
                    Link { to: Route::SignupComponent {}, class: "text-accent", "Sign up" }
                }
            }
        }
    }
}
