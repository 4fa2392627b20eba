use dioxus::prelude::*;

use crate::Route;

#[component]
pub fn NotFoundComponent(segments: Vec<String>) -> Element {
    let path = format!("/{}", segments.join("/"));
    tracing::warn!(%path, "no route matched");

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            div { class: "panel empty-state",
                div { class: "empty-state-icon", "404" }
                p { class: "empty-state-title", "Oops! Page not found" }
                p { class: "text-muted font-mono", "{path}" }
                Link { to: Route::HomeComponent {}, class: "btn btn-primary", "Return to Home" }
            }
        }
    }
}
