use std::time::Duration;

use jirolog::form::{AuthInput, RecordInput};
use jirolog::photo::ImageAction;
use jirolog::{App as Controller, Outcome, Tab};
use leptos::ev;
use leptos::prelude::*;
use tracing::{info, warn};
use wasm_bindgen::JsCast;

use crate::ui_model::ToastQueue;

mod dom;
mod files;
mod logging;
mod shell;
mod storage;

use shell::{DeleteModal, Header, TabBar, ToastStack};
use storage::LocalStorage;

pub fn start() {
    logging::init();
    info!("jirolog starting");
    mount_to_body(|| view! { <App /> });
}

/// Handles shared by every event handler. All fields are arena handles, so
/// this is `Copy` and moves freely into closures.
#[derive(Clone, Copy)]
struct Ui {
    app: StoredValue<Controller<LocalStorage>>,
    main_html: RwSignal<String>,
    auth_html: RwSignal<Option<String>>,
    tab: RwSignal<Tab>,
    delete_open: RwSignal<bool>,
    toasts: RwSignal<ToastQueue>,
}

impl Ui {
    fn with_app<U>(self, f: impl FnOnce(&mut Controller<LocalStorage>) -> U) -> Option<U> {
        let mut out = None;
        self.app.update_value(|a| out = Some(f(a)));
        out
    }

    fn refresh(self) {
        let (main, tab) = self.app.with_value(|a| (a.render_main(), a.active_tab()));
        self.main_html.set(main);
        self.tab.set(tab);
        self.refresh_auth();
    }

    fn refresh_auth(self) {
        self.auth_html.set(self.app.with_value(|a| a.auth_overlay()));
    }

    /// Re-render only the list region so the search box keeps focus.
    fn refresh_results(self) {
        let Some(html) = self.app.with_value(|a| a.render_results()) else {
            return;
        };
        if let Some(region) = dom::query("[data-results]") {
            region.set_inner_html(&html);
        }
    }

    fn route_to_current_hash(self) {
        let hash = dom::current_hash();
        self.with_app(|a| a.navigate(&hash));
        self.delete_open.set(false);
        self.refresh();
    }

    fn go(self, hash: &str) {
        // Same hash fires no hashchange; route directly.
        if dom::current_hash() == hash {
            self.route_to_current_hash();
        } else {
            dom::set_hash(hash);
        }
    }

    fn show(self, outcome: Outcome) {
        if let Some(message) = outcome.toast {
            let id = self.toasts.try_update(|q| q.push(message));
            let ms = self.app.with_value(|a| a.config().toast_duration_ms);
            let toasts = self.toasts;
            if let Some(id) = id {
                set_timeout(
                    move || toasts.update(|q| q.dismiss(id)),
                    Duration::from_millis(u64::from(ms)),
                );
            }
        }
        if let Some(hash) = outcome.navigate {
            self.go(&hash);
        }
    }

    /// Push the current photo edit into the form without re-rendering it.
    fn sync_preview(self) {
        let (src, crop) = self
            .app
            .with_value(|a| (a.preview_src().to_string(), a.photo_crop()));
        if let Some(img) = dom::query("[data-preview]") {
            let _ = img.set_attribute("src", &src);
        }
        if let Some(button) = dom::query("[data-image-action=\"crop\"]") {
            let _ = button.class_list().toggle_with_force("active", crop);
        }
    }
}

fn on_main_click(ui: Ui, ev: ev::MouseEvent) {
    let Some(target) = dom::event_element(&ev) else {
        return;
    };

    if let Some(link) = dom::closest_attr(&target, "data-link") {
        ui.go(&link);
        return;
    }
    if let Some(button) = dom::closest(&target, "[data-option]") {
        dom::select_option(&button);
        return;
    }
    if dom::closest(&target, "[data-delete]").is_some() {
        let open = ui.with_app(|a| a.request_delete()).unwrap_or(false);
        ui.delete_open.set(open);
        return;
    }
    if let Some(action) =
        dom::closest_attr(&target, "data-image-action").and_then(|a| ImageAction::parse(&a))
    {
        if let Some(outcome) = ui.with_app(|a| a.image_action(action)) {
            ui.show(outcome);
        }
        ui.sync_preview();
        return;
    }
    if dom::closest(&target, "[data-auth-open]").is_some() {
        if let Some(outcome) = ui.with_app(|a| a.open_sign_in()) {
            ui.show(outcome);
        }
        ui.refresh_auth();
    }
}

fn on_main_input(ui: Ui, ev: ev::Event) {
    let Some(input) = ev
        .target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
    else {
        return;
    };
    if input.has_attribute("data-search") {
        let term = input.value();
        ui.with_app(|a| a.set_search(&term));
        ui.refresh_results();
    } else if input.has_attribute("data-shop-select") {
        let shop = input.value();
        if let Some(outcome) = ui.with_app(|a| a.select_shop(&shop)) {
            ui.show(outcome);
        }
        ui.refresh_results();
    }
}

fn on_main_change(ui: Ui, ev: ev::Event) {
    let Some(target) = dom::event_element(&ev) else {
        return;
    };
    if target.has_attribute("data-sort") {
        let Some(order) = target
            .dyn_ref::<web_sys::HtmlSelectElement>()
            .map(|s| s.value())
        else {
            return;
        };
        ui.with_app(|a| a.set_order(&order));
        ui.refresh_results();
        return;
    }
    if target.has_attribute("data-image-input") {
        let Some((file, mime)) = target
            .dyn_ref::<web_sys::HtmlInputElement>()
            .and_then(files::picked_file)
        else {
            return;
        };
        wasm_bindgen_futures::spawn_local(async move {
            match files::read_file_bytes(file).await {
                Ok(bytes) => {
                    ui.with_app(|a| a.load_photo(&bytes, &mime));
                    ui.sync_preview();
                }
                Err(e) => warn!("Could not read picked photo: {}", e),
            }
        });
    }
}

fn on_main_submit(ui: Ui, ev: ev::SubmitEvent) {
    let Some(form) = ev
        .target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlFormElement>().ok())
    else {
        return;
    };
    if !form.has_attribute("data-form") {
        return;
    }
    ev.prevent_default();
    let input = RecordInput::from_pairs(dom::form_pairs(&form));
    if let Some(outcome) = ui.with_app(|a| a.submit_record(input)) {
        ui.show(outcome);
    }
}

fn on_auth_click(ui: Ui, ev: ev::MouseEvent) {
    let Some(target) = dom::event_element(&ev) else {
        return;
    };
    if dom::closest(&target, "[data-auth-toggle]").is_some() {
        ui.with_app(|a| a.toggle_auth_mode());
        ui.refresh_auth();
    } else if dom::closest(&target, "[data-auth-skip]").is_some() {
        if let Some(outcome) = ui.with_app(|a| a.skip_auth()) {
            ui.show(outcome);
        }
        ui.refresh_auth();
    }
}

fn on_auth_submit(ui: Ui, ev: ev::SubmitEvent) {
    let Some(form) = ev
        .target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlFormElement>().ok())
    else {
        return;
    };
    ev.prevent_default();
    let input = AuthInput::from_pairs(dom::form_pairs(&form));
    if let Some(outcome) = ui.with_app(|a| a.sign_in(input)) {
        ui.refresh_auth();
        ui.show(outcome);
    }
}

#[component]
fn App() -> impl IntoView {
    let ui = Ui {
        app: StoredValue::new(Controller::new(LocalStorage)),
        main_html: RwSignal::new(String::new()),
        auth_html: RwSignal::new(None),
        tab: RwSignal::new(Tab::Community),
        delete_open: RwSignal::new(false),
        toasts: RwSignal::new(ToastQueue::default()),
    };

    ui.route_to_current_hash();
    let _ = window_event_listener(ev::hashchange, move |_| ui.route_to_current_hash());

    let select_tab = Callback::new(move |tab: Tab| ui.go(&tab.route().to_hash()));
    let cancel_delete = Callback::new(move |_| {
        ui.with_app(|a| a.cancel_delete());
        ui.delete_open.set(false);
    });
    let confirm_delete = Callback::new(move |_| {
        ui.delete_open.set(false);
        if let Some(outcome) = ui.with_app(|a| a.confirm_delete()) {
            ui.show(outcome);
        }
    });

    view! {
        <div class="app-shell">
            <Header />
            <main
                id="app"
                inner_html=move || ui.main_html.get()
                on:click=move |ev| on_main_click(ui, ev)
                on:input=move |ev| on_main_input(ui, ev)
                on:change=move |ev| on_main_change(ui, ev)
                on:submit=move |ev| on_main_submit(ui, ev)
            ></main>
            <TabBar active=ui.tab.read_only() on_select=select_tab />
            <DeleteModal
                open=ui.delete_open.read_only()
                on_cancel=cancel_delete
                on_confirm=confirm_delete
            />
            <div
                class=move || if ui.auth_html.get().is_some() { "auth-overlay show" } else { "auth-overlay" }
                aria-hidden=move || if ui.auth_html.get().is_some() { "false" } else { "true" }
                inner_html=move || ui.auth_html.get().unwrap_or_default()
                on:click=move |ev| on_auth_click(ui, ev)
                on:submit=move |ev| on_auth_submit(ui, ev)
            ></div>
            <ToastStack toasts=ui.toasts />
        </div>
    }
}
