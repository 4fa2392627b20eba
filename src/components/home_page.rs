use dioxus::prelude::*;

use crate::components::use_app;
use crate::Route;

struct Feature {
    icon: &'static str,
    title: &'static str,
    description: &'static str,
}

const FEATURES: [Feature; 4] = [
    Feature {
        icon: "🌐",
        title: "Decentralized Storage",
        description: "Store your files on IPFS network with permanent, distributed access",
    },
    Feature {
        icon: "⛓️",
        title: "Blockchain Integration",
        description: "Connect your Web3 wallet for secure blockchain interactions",
    },
    Feature {
        icon: "🔗",
        title: "Content Addressed",
        description: "Every file is identified by the hash of its content, so links never drift",
    },
    Feature {
        icon: "🌍",
        title: "Global Access",
        description: "Access your files from anywhere in the world, anytime",
    },
];

const TECHNOLOGY: [(&str, &str); 3] = [
    ("IPFS Network", "InterPlanetary File System for distributed, permanent storage"),
    ("Web3 Integration", "Connect your wallet and interact with blockchain technology"),
    ("Rust Frontend", "Responsive interface built with Rust and Dioxus, compiled to WebAssembly"),
];

#[component]
pub fn HomeComponent() -> Element {
    let app = use_app();
    let is_authenticated = app.state.user.read().is_some();

    rsx! {
        div { class: "page-container py-8 animate-fade-in",
            // Hero
            section { class: "hero",
                h1 { class: "hero-title",
                    "Welcome to "
                    span { class: "text-accent", "StorageX" }
                }
                p { class: "hero-subtitle",
                    "The future of decentralized storage. Store, access, and manage your files on the InterPlanetary File System with blockchain security."
                }
                div { class: "hero-actions",
                    if is_authenticated {
                        Link { to: Route::DashboardComponent {}, class: "btn btn-primary btn-lg", "Go to Dashboard" }
                    } else {
                        Link { to: Route::SignupComponent {}, class: "btn btn-primary btn-lg", "Get Started Free" }
                        Link { to: Route::LoginComponent {}, class: "btn btn-outline btn-lg", "Sign In" }
                    }
                }
            }

            section { class: "section",
                h2 { class: "section-title", "Why Choose StorageX?" }
                p { class: "section-subtitle", "Experience the next generation of file storage with cutting-edge technology" }
                div { class: "grid grid-4",
                    for feature in FEATURES.iter() {
                        div { key: "{feature.title}", class: "panel feature-card",
                            div { class: "feature-icon", "{feature.icon}" }
                            h3 { class: "panel-title", "{feature.title}" }
                            p { class: "text-muted", "{feature.description}" }
                        }
                    }
                }
            }

            section { class: "section",
                h2 { class: "section-title", "Powered by Modern Technology" }
                p { class: "section-subtitle", "Built with the latest in decentralized technology stack" }
                div { class: "grid grid-3",
                    for (name, blurb) in TECHNOLOGY.iter() {
                        div { key: "{name}", class: "tech-item",
                            h3 { class: "tech-name", "{name}" }
                            p { class: "text-muted", "{blurb}" }
                        }
                    }
                }
            }

            if !is_authenticated {
                section { class: "panel cta",
                    h2 { class: "section-title", "Ready to Get Started?" }
                    p { class: "section-subtitle", "Join thousands of users who trust StorageX for their decentralized storage needs" }
                    Link { to: Route::SignupComponent {}, class: "btn btn-primary btn-lg", "Start Your Journey" }
                }
            }
        }
    }
}
