//! Delete Schedule Button Component
//!
//! Inline delete for one card. Protected items get a disabled button
//! explaining why; deletable ones ask with the item's title before
//! anything is removed.

use leptos::prelude::*;

#[component]
pub fn DeleteScheduleButton(
    #[prop(into)] item_title: Signal<String>,
    /// False while the delete policy protects the item
    #[prop(into)]
    allowed: Signal<bool>,
    #[prop(into)] on_confirm: Callback<()>,
) -> impl IntoView {
    let (confirming, set_confirming) = signal(false);

    // A completed item that is reopened elsewhere must not stay armed
    Effect::new(move |_| {
        if !allowed.get() {
            set_confirming.set(false);
        }
    });

    let hint = move || {
        if allowed.get() {
            "この予定を削除"
        } else {
            "完了した予定のみ削除できます"
        }
    };

    view! {
        <Show
            when=move || confirming.get() && allowed.get()
            fallback=move || {
                view! {
                    <button
                        class="delete-btn"
                        title=hint
                        disabled=move || !allowed.get()
                        on:click=move |ev| {
                            ev.stop_propagation();
                            set_confirming.set(true);
                        }
                    >
                        "🗑"
                    </button>
                }
            }
        >
            <span class="delete-confirm">
                <span class="delete-confirm-text">
                    {move || format!("「{}」を削除しますか?", item_title.get())}
                </span>
                <button
                    class="confirm-btn"
                    title="削除する"
                    on:click=move |ev| {
                        ev.stop_propagation();
                        set_confirming.set(false);
                        on_confirm.run(());
                    }
                >
                    "削除"
                </button>
                <button
                    class="cancel-btn"
                    title="やめる"
                    on:click=move |ev| {
                        ev.stop_propagation();
                        set_confirming.set(false);
                    }
                >
                    "やめる"
                </button>
            </span>
        </Show>
    }
}
