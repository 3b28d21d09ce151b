//! Timeline Header Component
//!
//! Title with item counts, view toggles and a manual refresh.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::context::AppContext;
use crate::store::{use_app_store, AppStateStoreFields};

#[component]
pub fn TimelineHeader() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let store = use_app_store();
    let (refreshing, set_refreshing) = signal(false);

    let counts = move || {
        store.items().with(|items| {
            let done = items.iter().filter(|i| i.is_completed).count();
            (items.len() - done, done)
        })
    };

    let refresh = move |_| {
        if refreshing.get_untracked() {
            return;
        }
        set_refreshing.set(true);
        let service = ctx.service();
        spawn_local(async move {
            if let Err(e) = commands::refresh_schedules(&service).await {
                ctx.notify_error(format!("更新できませんでした: {}", e));
            }
            set_refreshing.set(false);
        });
    };

    view! {
        <header class="timeline-header">
            <div class="header-title">
                <h1>"スケジュール"</h1>
                <span class="header-count">
                    {move || {
                        let (active, done) = counts();
                        format!("{}件 / 完了 {}件", active, done)
                    }}
                </span>
            </div>
            <div class="header-controls">
                <label class="toggle">
                    <input
                        type="checkbox"
                        prop:checked=move || store.show_completed().get()
                        on:change=move |_| store.show_completed().update(|v| *v = !*v)
                    />
                    "完了済み"
                </label>
                <label class="toggle">
                    <input
                        type="checkbox"
                        prop:checked=move || store.show_relative_time().get()
                        on:change=move |_| store.show_relative_time().update(|v| *v = !*v)
                    />
                    "相対表示"
                </label>
                <button
                    class="header-btn refresh"
                    title="更新"
                    disabled=move || refreshing.get()
                    on:click=refresh
                >
                    "⟳"
                </button>
            </div>
        </header>
    }
}
