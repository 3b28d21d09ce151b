//! Add Schedule Modal Component
//!
//! Text or image input. The draft is parsed first and stored only if the
//! modal is still waiting for that request, so closing it while a parse
//! is in flight discards the result.

use leptos::prelude::*;
use leptos::task::spawn_local;
use schedule_core::{ItemId, ParsedDraft, Ticket, TicketCounter};
use wasm_bindgen::JsCast;

use crate::commands::{self, PickedFile};
use crate::context::AppContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputMode {
    Text,
    Image,
}

#[component]
pub fn AddScheduleModal() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");
    let supports_images = ctx.service().supports_images();

    let (mode, set_mode) = signal(InputMode::Text);
    let (text, set_text) = signal(String::new());
    let (file_name, set_file_name) = signal::<Option<String>>(None);
    let picked: StoredValue<Option<PickedFile>, LocalStorage> = StoredValue::new_local(None);
    let (processing, set_processing) = signal(false);
    let tickets = StoredValue::new(TicketCounter::new());

    let is_open = move || ctx.adding.get().is_some();
    let parent = move || ctx.adding.get().flatten();
    let image_allowed = move || supports_images && parent().is_none();

    let reset = move || {
        set_mode.set(InputMode::Text);
        set_text.set(String::new());
        set_file_name.set(None);
        picked.set_value(None);
        set_processing.set(false);
    };

    let close = move || {
        tickets.update_value(|t| t.invalidate());
        reset();
        ctx.close_add();
    };

    let is_live = move |ticket: Ticket| tickets.with_value(|t| t.is_current(ticket));

    // Store the draft only if `ticket` is still the live request
    let finish = move |ticket: Ticket, parent_id: Option<ItemId>, draft: Result<ParsedDraft, String>, from_image: bool| {
        if !is_live(ticket) {
            tracing::debug!("discarding parse result for a closed modal");
            return;
        }
        let draft = match draft {
            Ok(draft) => draft,
            Err(e) => {
                set_processing.set(false);
                ctx.notify_error(format!("予定を読み取れませんでした: {}", e));
                return;
            }
        };
        let service = ctx.service();
        spawn_local(async move {
            match commands::create_schedule(&service, &draft, parent_id, from_image).await {
                // The modal may have been closed and reopened meanwhile
                Ok(ids) => {
                    tracing::info!(created = ids.len(), "schedule added");
                    if is_live(ticket) {
                        close();
                    }
                }
                Err(e) => {
                    if is_live(ticket) {
                        set_processing.set(false);
                    }
                    ctx.notify_error(format!("予定を追加できませんでした: {}", e));
                }
            }
        });
    };

    let submit = move |_| {
        if processing.get_untracked() {
            return;
        }
        let parent_id = ctx.adding.get_untracked().flatten();
        let service = ctx.service();

        match mode.get_untracked() {
            InputMode::Text => {
                let input = text.get_untracked();
                if input.trim().is_empty() {
                    return;
                }
                let ticket = tickets.try_update_value(|t| t.issue());
                let Some(ticket) = ticket else { return };
                set_processing.set(true);
                spawn_local(async move {
                    let draft = commands::parse_schedule_text(&service, &input).await;
                    finish(ticket, parent_id, draft, false);
                });
            }
            InputMode::Image => {
                let Some(file) = picked.with_value(|p| p.as_ref().map(|f| (f.bytes.clone(), f.mime.clone()))) else {
                    ctx.notify_error("画像を選択してください");
                    return;
                };
                let Some(ticket) = tickets.try_update_value(|t| t.issue()) else { return };
                set_processing.set(true);
                spawn_local(async move {
                    let (bytes, mime) = file;
                    let draft = commands::parse_schedule_image(&service, &bytes, &mime).await;
                    finish(ticket, None, draft, true);
                });
            }
        }
    };

    let on_file_change = move |ev: web_sys::Event| {
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            picked.set_value(None);
            set_file_name.set(None);
            return;
        };
        spawn_local(async move {
            match commands::read_picked_file(file).await {
                Ok(file) => {
                    set_file_name.set(Some(file.name.clone()));
                    picked.set_value(Some(file));
                }
                Err(e) => ctx.notify_error(e),
            }
        });
    };

    let can_submit = move || {
        !processing.get()
            && match mode.get() {
                InputMode::Text => !text.get().trim().is_empty(),
                InputMode::Image => file_name.get().is_some(),
            }
    };

    view! {
        <Show when=is_open>
            <div class="modal-backdrop" on:click=move |_| close()>
                <div class="modal add-schedule-modal" on:click=|ev| ev.stop_propagation()>
                    <h2>{move || if parent().is_some() { "サブタスクを追加" } else { "新しい予定を追加" }}</h2>

                    <Show when=image_allowed>
                        <div class="mode-tabs">
                            <button
                                class="mode-tab"
                                class:active=move || mode.get() == InputMode::Text
                                on:click=move |_| set_mode.set(InputMode::Text)
                            >
                                "テキストで入力"
                            </button>
                            <button
                                class="mode-tab"
                                class:active=move || mode.get() == InputMode::Image
                                on:click=move |_| set_mode.set(InputMode::Image)
                            >
                                "画像から読み取る"
                            </button>
                        </div>
                    </Show>

                    <Show
                        when=move || mode.get() == InputMode::Text
                        fallback=move || view! {
                            <label class="file-picker">
                                <input type="file" accept="image/*" on:change=on_file_change />
                                <span>{move || file_name.get().unwrap_or_else(|| "画像を選択".to_string())}</span>
                            </label>
                        }
                    >
                        <textarea
                            class="schedule-input"
                            placeholder="例: 明日15時に渋谷で打ち合わせ"
                            prop:value=move || text.get()
                            on:input=move |ev| set_text.set(event_target_value(&ev))
                        />
                    </Show>

                    <div class="modal-actions">
                        <button class="cancel-btn" on:click=move |_| close()>"キャンセル"</button>
                        <button class="primary-btn" disabled=move || !can_submit() on:click=submit>
                            {move || if processing.get() { "処理中..." } else { "追加" }}
                        </button>
                    </div>
                </div>
            </div>
        </Show>
    }
}
