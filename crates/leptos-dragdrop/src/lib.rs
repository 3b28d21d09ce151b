//! Leptos DragDrop Utilities
//!
//! Mouse drag-and-drop with a movement threshold (click vs drag), plus
//! horizontal swipe channels that feed touch and mouse input through the
//! same three callbacks. Knows nothing about what is being dragged.

use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Movement threshold in pixels to start dragging
const DRAG_THRESHOLD_PX: i32 = 5;
/// How long `just_ended` stays set so the trailing click can be ignored
const JUST_ENDED_MS: i32 = 100;

/// Pointer position over a hovered drop target
#[derive(Clone, Debug, PartialEq)]
pub struct DropHover<Id> {
    pub target: Id,
    /// Pointer Y relative to the target's top edge
    pub offset_y: f64,
    /// Target height at the time of the move
    pub height: f64,
}

/// DnD state signals
pub struct DndSignals<Id: Send + Sync + 'static> {
    pub dragging_read: ReadSignal<Option<Id>>,
    pub dragging_write: WriteSignal<Option<Id>>,
    pub hover_read: ReadSignal<Option<DropHover<Id>>>,
    pub hover_write: WriteSignal<Option<DropHover<Id>>>,
    pub just_ended_read: ReadSignal<bool>,
    pub just_ended_write: WriteSignal<bool>,
    /// Pressed but not yet past the threshold
    pub pending_read: ReadSignal<Option<Id>>,
    pub pending_write: WriteSignal<Option<Id>>,
    /// Mousedown position
    pub start_read: ReadSignal<(i32, i32)>,
    pub start_write: WriteSignal<(i32, i32)>,
}

impl<Id: Send + Sync + 'static> Clone for DndSignals<Id> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Id: Send + Sync + 'static> Copy for DndSignals<Id> {}

impl<Id> DndSignals<Id>
where
    Id: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn is_dragging(&self) -> bool {
        self.dragging_read.get_untracked().is_some()
    }

    /// Reactive: the item currently dragged
    pub fn dragging(&self) -> Option<Id> {
        self.dragging_read.get()
    }

    /// Reactive: hover geometry if `id` is the current drop target
    pub fn hover_over(&self, id: &Id) -> Option<DropHover<Id>> {
        self.hover_read.get().filter(|hover| &hover.target == id)
    }

    /// True right after a drag, while its trailing click is delivered
    pub fn just_ended(&self) -> bool {
        self.just_ended_read.get_untracked()
    }
}

pub fn create_dnd_signals<Id>() -> DndSignals<Id>
where
    Id: Clone + PartialEq + Send + Sync + 'static,
{
    let (dragging_read, dragging_write) = signal(None::<Id>);
    let (hover_read, hover_write) = signal(None::<DropHover<Id>>);
    let (just_ended_read, just_ended_write) = signal(false);
    let (pending_read, pending_write) = signal(None::<Id>);
    let (start_read, start_write) = signal((0i32, 0i32));
    DndSignals {
        dragging_read,
        dragging_write,
        hover_read,
        hover_write,
        just_ended_read,
        just_ended_write,
        pending_read,
        pending_write,
        start_read,
        start_write,
    }
}

/// End drag operation
pub fn end_drag<Id>(dnd: &DndSignals<Id>)
where
    Id: Clone + PartialEq + Send + Sync + 'static,
{
    let was_dragging = dnd.is_dragging();
    dnd.dragging_write.set(None);
    dnd.hover_write.set(None);
    dnd.pending_write.set(None);
    if !was_dragging {
        return;
    }

    dnd.just_ended_write.set(true);
    if let Some(win) = web_sys::window() {
        let clear = dnd.just_ended_write;
        let cb = Closure::<dyn FnMut()>::new(move || {
            clear.set(false);
        });
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            JUST_ENDED_MS,
        );
        cb.forget();
    }
}

/// Mousedown on a draggable row: record a pending drag
pub fn make_on_mousedown<Id>(dnd: DndSignals<Id>, id: Id) -> impl Fn(web_sys::MouseEvent) + Clone + 'static
where
    Id: Clone + PartialEq + Send + Sync + 'static,
{
    move |ev: web_sys::MouseEvent| {
        if ev.button() != 0 {
            return;
        }
        // Controls inside the row keep their own clicks
        if let Some(target) = ev.target() {
            if target.dyn_ref::<web_sys::HtmlInputElement>().is_some()
                || target.dyn_ref::<web_sys::HtmlButtonElement>().is_some()
            {
                return;
            }
        }
        dnd.pending_write.set(Some(id.clone()));
        dnd.start_write.set((ev.client_x(), ev.client_y()));
    }
}

/// Document mousemove: promote a pending drag once past the threshold
fn bind_global_mousemove<Id>(dnd: DndSignals<Id>)
where
    Id: Clone + PartialEq + Send + Sync + 'static,
{
    let on_mousemove = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: web_sys::MouseEvent| {
        let Some(pending) = dnd.pending_read.get_untracked() else {
            return;
        };
        if dnd.is_dragging() {
            return;
        }
        let (start_x, start_y) = dnd.start_read.get_untracked();
        let dx = (ev.client_x() - start_x).abs();
        let dy = (ev.client_y() - start_y).abs();
        if dx > DRAG_THRESHOLD_PX || dy > DRAG_THRESHOLD_PX {
            dnd.dragging_write.set(Some(pending));
        }
    });

    if let Some(doc) = web_sys::window().and_then(|win| win.document()) {
        let _ = doc.add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref());
    }
    on_mousemove.forget();
}

/// Mousemove over a potential drop target: track pointer geometry
pub fn make_on_item_mousemove<Id>(dnd: DndSignals<Id>, id: Id) -> impl Fn(web_sys::MouseEvent) + Clone + 'static
where
    Id: Clone + PartialEq + Send + Sync + 'static,
{
    move |ev: web_sys::MouseEvent| {
        let Some(dragging) = dnd.dragging_read.get_untracked() else {
            return;
        };
        if dragging == id {
            dnd.hover_write.set(None);
            return;
        }
        let Some(element) = ev
            .current_target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        else {
            return;
        };
        let rect = element.get_bounding_client_rect();
        let hover = DropHover {
            target: id.clone(),
            offset_y: f64::from(ev.client_y()) - rect.top(),
            height: rect.height(),
        };
        if dnd.hover_read.get_untracked().as_ref() != Some(&hover) {
            dnd.hover_write.set(Some(hover));
        }
    }
}

/// Mouseleave on a drop target
pub fn make_on_mouseleave<Id>(dnd: DndSignals<Id>, id: Id) -> impl Fn(web_sys::MouseEvent) + Clone + 'static
where
    Id: Clone + PartialEq + Send + Sync + 'static,
{
    move |_ev: web_sys::MouseEvent| {
        let leaving = dnd
            .hover_read
            .get_untracked()
            .is_some_and(|hover| hover.target == id);
        if leaving {
            dnd.hover_write.set(None);
        }
    }
}

/// Bind the document mouseup that completes a drop, and the mousemove that
/// starts drags. `on_drop` receives the dragged id and the last hover.
pub fn bind_global_mouseup<Id, F>(dnd: DndSignals<Id>, on_drop: F)
where
    Id: Clone + PartialEq + Send + Sync + 'static,
    F: Fn(Id, DropHover<Id>) + 'static,
{
    let on_mouseup = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_ev: web_sys::MouseEvent| {
        let dragged = dnd.dragging_read.get_untracked();
        let hover = dnd.hover_read.get_untracked();
        end_drag(&dnd);
        if let (Some(dragged), Some(hover)) = (dragged, hover) {
            on_drop(dragged, hover);
        }
    });

    if let Some(doc) = web_sys::window().and_then(|win| win.document()) {
        let _ = doc.add_event_listener_with_callback("mouseup", on_mouseup.as_ref().unchecked_ref());
    }
    on_mouseup.forget();

    bind_global_mousemove(dnd);
}

/// Horizontal swipe callbacks, shared by the touch and mouse channels
#[derive(Clone, Copy)]
pub struct SwipeHandlers {
    /// Gesture starts at client X
    pub on_start: Callback<f64>,
    /// Pointer moved to client X; return true to suppress scrolling
    pub on_move: Callback<f64, bool>,
    /// Gesture released or cancelled
    pub on_end: Callback<()>,
}

fn touch_x(ev: &web_sys::TouchEvent) -> Option<f64> {
    ev.touches()
        .get(0)
        .or_else(|| ev.changed_touches().get(0))
        .map(|touch| f64::from(touch.client_x()))
}

pub fn make_on_touchstart(handlers: SwipeHandlers) -> impl Fn(web_sys::TouchEvent) + Copy + 'static {
    move |ev: web_sys::TouchEvent| {
        if let Some(x) = touch_x(&ev) {
            handlers.on_start.run(x);
        }
    }
}

pub fn make_on_touchmove(handlers: SwipeHandlers) -> impl Fn(web_sys::TouchEvent) + Copy + 'static {
    move |ev: web_sys::TouchEvent| {
        if let Some(x) = touch_x(&ev) {
            if handlers.on_move.run(x) && ev.cancelable() {
                ev.prevent_default();
            }
        }
    }
}

/// Also used for touchcancel
pub fn make_on_touchend(handlers: SwipeHandlers) -> impl Fn(web_sys::TouchEvent) + Copy + 'static {
    move |_ev: web_sys::TouchEvent| {
        handlers.on_end.run(());
    }
}

pub fn make_on_swipe_mousedown(handlers: SwipeHandlers) -> impl Fn(web_sys::MouseEvent) + Copy + 'static {
    move |ev: web_sys::MouseEvent| {
        if ev.button() == 0 {
            handlers.on_start.run(f64::from(ev.client_x()));
        }
    }
}

/// Only forwards while the primary button is held
pub fn make_on_swipe_mousemove(handlers: SwipeHandlers) -> impl Fn(web_sys::MouseEvent) + Copy + 'static {
    move |ev: web_sys::MouseEvent| {
        if ev.buttons() & 1 == 1 {
            handlers.on_move.run(f64::from(ev.client_x()));
        }
    }
}

/// Also used for mouseleave
pub fn make_on_swipe_mouseup(handlers: SwipeHandlers) -> impl Fn(web_sys::MouseEvent) + Copy + 'static {
    move |_ev: web_sys::MouseEvent| {
        handlers.on_end.run(());
    }
}
