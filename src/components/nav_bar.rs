use dioxus::prelude::*;

use crate::backend::AppCmd;
use crate::components::common::{short_address, Toaster};
use crate::components::use_app;
use crate::Route;

#[component]
pub fn NavComponent() -> Element {
    let app = use_app();
    let state = app.state;
    let navigator = use_navigator();

    let theme = *state.theme.read();
    let user = state.user.read().clone();
    let wallet = state.wallet.read().clone();
    let connecting = *state.wallet_connecting.read();
    let notifications = state.notifications.read().clone();
    let ttl_ms = app.config.notification_ttl_ms;

    let app_theme = app.clone();
    let on_toggle_theme = move |_| app_theme.send(AppCmd::ToggleTheme);

    let app_wallet = app.clone();
    let is_connected = wallet.is_connected();
    let on_wallet = move |_| {
        if is_connected {
            app_wallet.send(AppCmd::DisconnectWallet);
        } else {
            app_wallet.send(AppCmd::ConnectWallet);
        }
    };

    let app_logout = app.clone();
    let on_logout = move |_| {
        app_logout.send(AppCmd::Logout);
        navigator.push(Route::HomeComponent {});
    };

    let app_dismiss = app.clone();
    let on_dismiss = move |id: u64| app_dismiss.send(AppCmd::DismissNotification(id));

    let wallet_label = if connecting {
        "Connecting..."
    } else if is_connected {
        "Disconnect"
    } else {
        "Connect Wallet"
    };

    rsx! {
        div { class: "{theme.class()} min-h-screen flex flex-col",
            nav { class: "nav-bar",
                div { class: "page-container",
                    Link { to: Route::HomeComponent {}, class: "nav-logo",
                        div { class: "logo-icon" }
                        span { class: "logo-text", "StorageX" }
                    }

                    div { class: "nav-links",
                        if let Some(user) = &user {
                            span { class: "nav-welcome", "Welcome, {user.email}" }
                        }

                        if let Some(address) = wallet.address() {
                            span { class: "badge badge-wallet", "{short_address(address)}" }
                        }

                        button {
                            class: if is_connected { "btn btn-outline" } else { "btn btn-primary" },
                            disabled: connecting,
                            onclick: on_wallet,
                            "{wallet_label}"
                        }

                        button {
                            class: "btn btn-icon",
                            title: "Toggle theme",
                            onclick: on_toggle_theme,
                            "{theme.toggle_icon()}"
                        }

                        if user.is_some() {
                            Link { to: Route::DashboardComponent {}, class: "nav-link", active_class: "active", "Dashboard" }
                            Link { to: Route::ProfileComponent {}, class: "nav-link", active_class: "active", "Profile" }
                            button { class: "btn btn-ghost", onclick: on_logout, "Logout" }
                        } else {
                            Link { to: Route::LoginComponent {}, class: "nav-link", active_class: "active", "Login" }
                            Link { to: Route::SignupComponent {}, class: "btn btn-primary", "Sign Up" }
                        }
                    }
                }
            }

            div { class: "fixed-header-spacer" }

            div { class: "flex-1",
                Outlet::<Route> {}
            }

            Toaster { notifications, ttl_ms, on_dismiss }
        }
    }
}
