//! Quick Edit Dialog Component
//!
//! Edits one field of an item: the title, or the scheduled date and time.
//! Escape or the backdrop closes without saving.

use chrono::{Local, Utc};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use schedule_core::time_format::{format_absolute, format_datetime_local, parse_datetime_local};

use crate::commands;
use crate::context::{AppContext, EditField, EditRequest};

#[component]
pub fn QuickEditDialog() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let (value, set_value) = signal(String::new());
    let (saving, set_saving) = signal(false);

    // Seed the input whenever a new edit starts
    Effect::new(move |_| {
        if let Some(EditRequest { item, field }) = ctx.editing.get() {
            let initial = match field {
                EditField::Title => item.title.clone(),
                EditField::Date => format_datetime_local(item.scheduled_date.unwrap_or_else(Utc::now), &Local),
            };
            set_value.set(initial);
            set_saving.set(false);
        }
    });

    let handle = window_event_listener(ev::keydown, move |ev| {
        if ev.key() == "Escape" && ctx.editing.get_untracked().is_some() {
            ctx.close_edit();
        }
    });
    on_cleanup(move || handle.remove());

    let field = move || ctx.editing.get().map(|request| request.field);
    let preview = move || {
        parse_datetime_local(&value.get(), &Local)
            .map(|date| {
                let absolute = format_absolute(Some(date), &Local);
                format!("{} {}", absolute.date_label(), absolute.time_label().unwrap_or_default())
            })
            .unwrap_or_else(|| "日時が正しくありません".to_string())
    };

    let save = move |_| {
        let Some(EditRequest { item, field }) = ctx.editing.get_untracked() else {
            return;
        };
        let input = value.get_untracked();
        let service = ctx.service();

        match field {
            EditField::Title => {
                if input.trim().is_empty() {
                    ctx.notify_error("タイトルを入力してください");
                    return;
                }
                set_saving.set(true);
                spawn_local(async move {
                    match commands::update_schedule_title(&service, &item.id, &input).await {
                        Ok(()) => ctx.close_edit(),
                        Err(e) => {
                            set_saving.set(false);
                            ctx.notify_error(format!("保存できませんでした: {}", e));
                        }
                    }
                });
            }
            EditField::Date => {
                let Some(date) = parse_datetime_local(&input, &Local) else {
                    ctx.notify_error("日時が正しくありません");
                    return;
                };
                set_saving.set(true);
                spawn_local(async move {
                    match commands::update_schedule_date(&service, &item.id, Some(date)).await {
                        Ok(()) => ctx.close_edit(),
                        Err(e) => {
                            set_saving.set(false);
                            ctx.notify_error(format!("保存できませんでした: {}", e));
                        }
                    }
                });
            }
        }
    };

    view! {
        <Show when=move || ctx.editing.get().is_some()>
            <div class="modal-backdrop" on:click=move |_| ctx.close_edit()>
                <div class="modal quick-edit-dialog" on:click=|ev| ev.stop_propagation()>
                    <h2>{move || match field() {
                        Some(EditField::Date) => "日時を編集",
                        _ => "タイトルを編集",
                    }}</h2>

                    <Show
                        when=move || field() == Some(EditField::Date)
                        fallback=move || view! {
                            <input
                                type="text"
                                class="edit-input"
                                prop:value=move || value.get()
                                on:input=move |ev| set_value.set(event_target_value(&ev))
                            />
                        }
                    >
                        <input
                            type="datetime-local"
                            class="edit-input"
                            prop:value=move || value.get()
                            on:input=move |ev| set_value.set(event_target_value(&ev))
                        />
                        <p class="edit-preview">{preview}</p>
                    </Show>

                    <div class="modal-actions">
                        <button class="cancel-btn" on:click=move |_| ctx.close_edit()>"キャンセル"</button>
                        <button class="primary-btn" disabled=move || saving.get() on:click=save>
                            {move || if saving.get() { "保存中..." } else { "保存" }}
                        </button>
                    </div>
                </div>
            </div>
        </Show>
    }
}
