use jirolog::Tab;
use leptos::prelude::*;

use crate::ui_model::{tab_icon, tab_label, ToastQueue};

#[component]
pub(super) fn Header() -> impl IntoView {
    view! {
        <header class="app-header">
            <h1 class="brand">"ジロログ"</h1>
            <span class="subtle">"二郎の記録帳"</span>
        </header>
    }
}

#[component]
pub(super) fn TabBar(active: ReadSignal<Tab>, on_select: Callback<Tab>) -> impl IntoView {
    view! {
        <nav class="tab-bar">
            {Tab::all()
                .iter()
                .map(|&tab| {
                    view! {
                        <button
                            class=move || if active.get() == tab { "tab active" } else { "tab" }
                            data-tab=tab.as_str()
                            on:click=move |_| on_select.run(tab)
                        >
                            <span class="tab-icon">{tab_icon(tab)}</span>
                            <span class="tab-label">{tab_label(tab)}</span>
                        </button>
                    }
                })
                .collect_view()}
        </nav>
    }
}

#[component]
pub(super) fn ToastStack(toasts: RwSignal<ToastQueue>) -> impl IntoView {
    view! {
        <div class="toast-stack" aria-live="polite" aria-relevant="additions removals">
            <For
                each=move || toasts.get().items().to_vec()
                key=|t| t.id
                children=move |t| {
                    let id = t.id;
                    view! {
                        <div class="toast show" on:click=move |_| toasts.update(|q| q.dismiss(id))>
                            {t.message}
                        </div>
                    }
                }
            />
        </div>
    }
}

#[component]
pub(super) fn DeleteModal(
    open: ReadSignal<bool>,
    on_cancel: Callback<()>,
    on_confirm: Callback<()>,
) -> impl IntoView {
    view! {
        <div
            class=move || if open.get() { "modal show" } else { "modal" }
            aria-hidden=move || if open.get() { "false" } else { "true" }
            on:click=move |_| on_cancel.run(())
        >
            <div class="modal-card" on:click=|ev| ev.stop_propagation()>
                <h3>"この記録を削除しますか？"</h3>
                <p>"削除すると元に戻せません。"</p>
                <div class="modal-actions">
                    <button class="btn ghost" on:click=move |_| on_cancel.run(())>
                        "キャンセル"
                    </button>
                    <button class="btn danger" on:click=move |_| on_confirm.run(())>
                        "削除する"
                    </button>
                </div>
            </div>
        </div>
    }
}
