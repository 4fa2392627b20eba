mod backend;
mod components;
mod config;

use dioxus::prelude::*;
use tokio::sync::mpsc;

use backend::{AppCmd, AppEvent};
use components::dashboard_page::DashboardComponent;
use components::home_page::HomeComponent;
use components::login_page::LoginComponent;
use components::nav_bar::NavComponent;
use components::not_found_page::NotFoundComponent;
use components::profile_page::ProfileComponent;
use components::signup_page::SignupComponent;
use components::AppState;
use config::AppConfig;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[layout(NavComponent)]
    #[route("/")]
    HomeComponent {},
    #[route("/login")]
    LoginComponent {},
    #[route("/signup")]
    SignupComponent {},
    #[route("/dashboard")]
    DashboardComponent {},
    #[route("/profile")]
    ProfileComponent {},
    #[route("/:..segments")]
    NotFoundComponent { segments: Vec<String> },
}

fn main() {
    // The browser build logs to the console through the launcher's logger.
    #[cfg(not(target_arch = "wasm32"))]
    let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).try_init();

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let config = use_hook(AppConfig::load_or_default);
    let state = AppState::new(config.default_theme);
    use_context_provider(|| state);
    use_context_provider(|| config.clone());

    // Runs once: the backend task owns the receiving end of the commands.
    let cmd_tx = use_hook(|| {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<AppCmd>();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();
        spawn(backend::init(config.clone(), cmd_rx, event_tx));

        let mut state = state;
        spawn(async move {
            while let Some(event) = event_rx.recv().await {
                state.apply(event);
            }
            tracing::warn!("backend event stream ended");
        });
        cmd_tx
    });
    use_context_provider(|| cmd_tx);

    rsx! {
        document::Stylesheet { href: asset!("/assets/main.css") }
        Router::<Route> {}
    }
}
