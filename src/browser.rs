//! Browser host: wires DOM events into [`EngineCore`] and applies its actions.
//!
//! ARCHITECTURE
//! ============
//! The engine owns all canvas state and never touches the DOM. This host
//! reads pointer, keyboard and clipboard events off `document`, hands them to
//! the engine, and turns the returned [`Action`]s into element creation,
//! style writes and removals inside the `#images` container. Storage is
//! `window.localStorage` behind [`WebStorage`].
//!
//! Drag move/up listeners exist only while a gesture runs: they are attached
//! on [`Action::DragStarted`] and detached on [`Action::DragEnded`] or
//! [`Action::DragCancelled`]. A detached pair is parked until the next
//! gesture because the up listener is still executing when it detaches itself.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{AbortHandle, Abortable};
use js_sys::{Date, Math, Promise};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{
    Blob, ClipboardEvent, DataTransferItem, Document, Element, Event, EventTarget, FileReader, HtmlElement,
    HtmlImageElement, KeyboardEvent, MouseEvent, Storage, Window,
};

use crate::config::{Config, ConfigError};
use crate::engine::{Action, EngineCore};
use crate::geometry::{Point, Position};
use crate::id::ImageId;
use crate::input::{Button, Key};
use crate::paste::{PasteOpId, PasteTicket};
use crate::store::{KeyValueStore, StoreError};
use crate::throttle::Clock;

/// Error raised while mounting or driving the canvas in the browser.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no global window")]
    MissingWindow,
    #[error("window has no document")]
    MissingDocument,
    #[error("no element with id {0:?}")]
    MissingContainer(String),
    #[error("localStorage is unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("javascript error: {0}")]
    Js(String),
}

impl HostError {
    fn js(value: JsValue) -> Self {
        Self::Js(describe(&value))
    }
}

impl From<HostError> for JsValue {
    fn from(err: HostError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

// =============================================================
// Storage and clock
// =============================================================

/// `window.localStorage` as a [`KeyValueStore`].
pub struct WebStorage {
    storage: Storage,
}

impl WebStorage {
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

fn store_error(value: JsValue) -> StoreError {
    StoreError::Backend(describe(&value))
}

impl KeyValueStore for WebStorage {
    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let len = self.storage.length().map_err(store_error)?;
        let mut keys = Vec::new();
        for index in 0..len {
            if let Some(key) = self.storage.key(index).map_err(store_error)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(store_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(store_error)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(store_error)
    }
}

/// Wall clock backed by `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> f64 {
        Date::now()
    }
}

// =============================================================
// Entry points
// =============================================================

type Shared = Rc<RefCell<App>>;

thread_local! {
    static MOUNTED: RefCell<Option<Shared>> = const { RefCell::new(None) };
}

struct GestureListeners {
    on_move: Closure<dyn FnMut(Event)>,
    on_up: Closure<dyn FnMut(Event)>,
}

struct App {
    core: EngineCore<WebStorage, BrowserClock>,
    window: Window,
    document: Document,
    container: Element,
    gesture: Option<GestureListeners>,
    retired: Option<GestureListeners>,
    reads: HashMap<PasteOpId, AbortHandle>,
}

/// Runs when the wasm module is instantiated.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Mount the canvas with the default configuration. Call once the page has loaded.
///
/// # Errors
///
/// Fails if there is no document, no `#images` container, or no `localStorage`.
#[wasm_bindgen]
pub fn mount() -> Result<(), JsValue> {
    mount_config(Config::default())?;
    Ok(())
}

/// Mount the canvas with a JSON configuration; missing fields take defaults.
///
/// # Errors
///
/// Fails if the configuration is invalid or mounting fails as for [`mount`].
#[wasm_bindgen(js_name = mountWithConfig)]
pub fn mount_with_config(json: &str) -> Result<(), JsValue> {
    let config = Config::from_json(json).map_err(HostError::from)?;
    mount_config(config)?;
    Ok(())
}

fn mount_config(config: Config) -> Result<(), HostError> {
    config.validate()?;
    init_logging(&config)?;
    if MOUNTED.with(|mounted| mounted.borrow().is_some()) {
        log::warn!("image canvas already mounted");
        return Ok(());
    }

    let window = web_sys::window().ok_or(HostError::MissingWindow)?;
    let document = window.document().ok_or(HostError::MissingDocument)?;
    let container = document
        .get_element_by_id(&config.container_id)
        .ok_or_else(|| HostError::MissingContainer(config.container_id.clone()))?;
    let storage = window
        .local_storage()
        .map_err(HostError::js)?
        .ok_or(HostError::StorageUnavailable)?;

    let core = EngineCore::new(config, WebStorage::new(storage), BrowserClock, random_seed());
    let app = Rc::new(RefCell::new(App {
        core,
        window,
        document,
        container,
        gesture: None,
        retired: None,
        reads: HashMap::new(),
    }));

    let actions = app.borrow_mut().core.load_all();
    apply(&app, actions);
    attach_listeners(&app)?;

    log::info!("image canvas mounted");
    MOUNTED.with(|mounted| *mounted.borrow_mut() = Some(app));
    Ok(())
}

fn init_logging(config: &Config) -> Result<(), HostError> {
    let level = config.log_level_filter()?;
    if let Err(err) = console_log::init_with_level(level) {
        log::debug!("console logger already installed: {err}");
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn random_seed() -> u64 {
    let entropy = (Math::random() * 9_007_199_254_740_992.0) as u64;
    entropy ^ (Date::now() as u64).rotate_left(32)
}

// =============================================================
// Event wiring
// =============================================================

fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) -> Result<(), HostError> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(HostError::js)?;
    closure.forget();
    Ok(())
}

fn attach_listeners(app: &Shared) -> Result<(), HostError> {
    let (document, window) = {
        let state = app.borrow();
        (state.document.clone(), state.window.clone())
    };

    let app_ref = Rc::clone(app);
    listen(&document, "pointermove", move |ev: Event| {
        let Some(mouse) = ev.dyn_ref::<MouseEvent>() else {
            return;
        };
        let mut state = app_ref.borrow_mut();
        let scroll = scroll_offset(&state.window);
        state.core.track_pointer(client_point(mouse), scroll);
    })?;

    let app_ref = Rc::clone(app);
    listen(&document, "pointerdown", move |ev: Event| {
        let Some(mouse) = ev.dyn_ref::<MouseEvent>() else {
            return;
        };
        let actions = {
            let mut state = app_ref.borrow_mut();
            let target = target_image(&ev, state.core.config());
            let scroll = scroll_offset(&state.window);
            state
                .core
                .on_pointer_down(target.as_ref(), Button::from_dom(mouse.button()), client_point(mouse), scroll)
        };
        apply(&app_ref, actions);
    })?;

    let app_ref = Rc::clone(app);
    listen(&document, "click", move |ev: Event| {
        let actions = {
            let mut state = app_ref.borrow_mut();
            let target = target_image(&ev, state.core.config());
            state.core.on_click(target.as_ref())
        };
        apply(&app_ref, actions);
    })?;

    let app_ref = Rc::clone(app);
    listen(&document, "keydown", move |ev: Event| {
        let Some(keyboard) = ev.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        let actions = app_ref.borrow_mut().core.on_key_down(&Key(keyboard.key()));
        apply(&app_ref, actions);
    })?;

    let app_ref = Rc::clone(app);
    listen(&document, "paste", move |ev: Event| {
        if let Some(clipboard) = ev.dyn_ref::<ClipboardEvent>() {
            on_paste(&app_ref, clipboard);
        }
    })?;

    let app_ref = Rc::clone(app);
    listen(&window, "pagehide", move |_ev: Event| {
        let handles: Vec<AbortHandle> = {
            let mut state = app_ref.borrow_mut();
            let cancelled = state.core.cancel_pastes();
            cancelled.iter().filter_map(|op| state.reads.remove(op)).collect()
        };
        for handle in handles {
            handle.abort();
        }
    })?;

    Ok(())
}

fn client_point(ev: &MouseEvent) -> Point {
    Point::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}

fn scroll_offset(window: &Window) -> Point {
    Point::new(window.scroll_x().unwrap_or(0.0), window.scroll_y().unwrap_or(0.0))
}

/// The pasted image under the event target, if any.
fn target_image(ev: &Event, config: &Config) -> Option<ImageId> {
    let Ok(element) = ev.target()?.dyn_into::<Element>() else {
        return None;
    };
    let selector = format!("img[id^=\"{}\"]", config.element_id_prefix);
    match element.closest(&selector) {
        Ok(Some(image)) => config.id_from_element_id(&image.id()),
        Ok(None) => None,
        Err(err) => {
            log::debug!("closest({selector}) failed: {}", describe(&err));
            None
        }
    }
}

// =============================================================
// Drag gesture listeners
// =============================================================

fn attach_gesture(app: &Shared) -> Result<(), HostError> {
    let app_ref = Rc::clone(app);
    let on_move = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
        let Some(mouse) = ev.dyn_ref::<MouseEvent>() else {
            return;
        };
        let actions = {
            let mut state = app_ref.borrow_mut();
            let scroll = scroll_offset(&state.window);
            state.core.drag_to(client_point(mouse), scroll)
        };
        apply(&app_ref, actions);
    });

    let app_ref = Rc::clone(app);
    let on_up = Closure::<dyn FnMut(Event)>::new(move |_ev: Event| {
        let actions = app_ref.borrow_mut().core.end_drag();
        apply(&app_ref, actions);
    });

    let mut state = app.borrow_mut();
    // The parked pair belongs to a finished gesture and is not running.
    drop(state.retired.take());
    if let Some(stale) = state.gesture.take() {
        log::warn!("replacing drag listeners that were never detached");
        remove_gesture_listeners(&state.document, &stale)?;
        state.retired = Some(stale);
    }
    state
        .document
        .add_event_listener_with_callback("pointermove", on_move.as_ref().unchecked_ref())
        .map_err(HostError::js)?;
    state
        .document
        .add_event_listener_with_callback("pointerup", on_up.as_ref().unchecked_ref())
        .map_err(HostError::js)?;
    state.gesture = Some(GestureListeners { on_move, on_up });
    Ok(())
}

fn detach_gesture(app: &Shared) -> Result<(), HostError> {
    let mut state = app.borrow_mut();
    let Some(gesture) = state.gesture.take() else {
        return Ok(());
    };
    let removed = remove_gesture_listeners(&state.document, &gesture);
    state.retired = Some(gesture);
    removed
}

fn remove_gesture_listeners(document: &Document, gesture: &GestureListeners) -> Result<(), HostError> {
    document
        .remove_event_listener_with_callback("pointermove", gesture.on_move.as_ref().unchecked_ref())
        .map_err(HostError::js)?;
    document
        .remove_event_listener_with_callback("pointerup", gesture.on_up.as_ref().unchecked_ref())
        .map_err(HostError::js)
}

// =============================================================
// Paste
// =============================================================

fn on_paste(app: &Shared, ev: &ClipboardEvent) {
    let Some(data) = ev.clipboard_data() else {
        return;
    };
    let list = data.items();
    let items: Vec<DataTransferItem> = (0..list.length()).filter_map(|index| list.get(index)).collect();
    let types: Vec<String> = items.iter().map(DataTransferItem::type_).collect();

    let tickets = app.borrow_mut().core.begin_paste(&types);
    if tickets.is_empty() {
        return;
    }
    ev.prevent_default();

    for ticket in tickets {
        let file = match items.get(ticket.item_index).map(DataTransferItem::get_as_file) {
            Some(Ok(Some(file))) => file,
            Some(Ok(None)) | None => {
                app.borrow_mut().core.fail_paste(&ticket, "clipboard item has no file");
                continue;
            }
            Some(Err(err)) => {
                app.borrow_mut().core.fail_paste(&ticket, &describe(&err));
                continue;
            }
        };
        spawn_read(app, ticket, file.into());
    }
}

fn spawn_read(app: &Shared, ticket: PasteTicket, blob: Blob) {
    let (handle, registration) = AbortHandle::new_pair();
    app.borrow_mut().reads.insert(ticket.op, handle);

    let app_ref = Rc::clone(app);
    spawn_local(async move {
        let outcome = Abortable::new(read_data_url(blob), registration).await;
        app_ref.borrow_mut().reads.remove(&ticket.op);
        match outcome {
            Ok(Ok(data_url)) => {
                let actions = app_ref.borrow_mut().core.complete_paste(&ticket, data_url);
                apply(&app_ref, actions);
            }
            Ok(Err(err)) => app_ref.borrow_mut().core.fail_paste(&ticket, &err.to_string()),
            Err(_) => log::debug!("{} aborted", ticket.op),
        }
    });
}

async fn read_data_url(blob: Blob) -> Result<String, HostError> {
    let reader = FileReader::new().map_err(HostError::js)?;
    let loaded = Promise::new(&mut |resolve, reject| {
        reader.set_onload(Some(&resolve));
        reader.set_onerror(Some(&reject));
    });
    reader.read_as_data_url(&blob).map_err(HostError::js)?;
    JsFuture::from(loaded).await.map_err(HostError::js)?;
    reader
        .result()
        .map_err(HostError::js)?
        .as_string()
        .ok_or_else(|| HostError::Js("file reader result is not a string".to_owned()))
}

// =============================================================
// Applying actions
// =============================================================

fn apply(app: &Shared, actions: Vec<Action>) {
    for action in actions {
        if let Err(err) = apply_one(app, action) {
            log::error!("failed to apply canvas action: {err}");
        }
    }
}

fn apply_one(app: &Shared, action: Action) -> Result<(), HostError> {
    match action {
        Action::ImageCreated { id, src, position } => {
            let state = app.borrow();
            let image = create_image_element(&state.document, state.core.config(), &id, &src, position)?;
            state.container.append_child(&image).map_err(HostError::js)?;
        }
        Action::ImageMoved { id, position } => {
            if let Some(element) = image_element(&app.borrow(), &id) {
                place(&element, position)?;
            }
        }
        Action::ImageRemoved { id } => {
            if let Some(element) = image_element(&app.borrow(), &id) {
                element.remove();
            }
        }
        Action::SelectionMarked { id } => {
            let state = app.borrow();
            if let Some(element) = image_element(&state, &id) {
                set_style(&element, "border", &state.core.config().selected_border)?;
            }
        }
        Action::SelectionCleared { id } => {
            if let Some(element) = image_element(&app.borrow(), &id) {
                set_style(&element, "border", "none")?;
            }
        }
        Action::DragStarted { .. } => attach_gesture(app)?,
        Action::DragEnded { .. } | Action::DragCancelled { .. } => detach_gesture(app)?,
    }
    Ok(())
}

fn image_element(state: &App, id: &ImageId) -> Option<HtmlElement> {
    let element = state.document.get_element_by_id(&state.core.config().element_id(id))?;
    match element.dyn_into::<HtmlElement>() {
        Ok(element) => Some(element),
        Err(_) => {
            log::warn!("element for image {id} is not an html element");
            None
        }
    }
}

fn create_image_element(
    document: &Document,
    config: &Config,
    id: &ImageId,
    src: &str,
    position: Position,
) -> Result<HtmlImageElement, HostError> {
    let image = document
        .create_element("img")
        .map_err(HostError::js)?
        .dyn_into::<HtmlImageElement>()
        .map_err(|_| HostError::Js("created element is not an img".to_owned()))?;
    image.set_src(src);
    image.set_alt("pasted-image");
    image.set_id(&config.element_id(id));
    image.set_draggable(false);
    set_style(&image, "width", "auto")?;
    set_style(&image, "min-height", &format!("{}px", config.min_height_px))?;
    set_style(&image, "max-height", &format!("{}px", config.max_height_px))?;
    set_style(&image, "position", "absolute")?;
    set_style(&image, "cursor", "move")?;
    place(&image, position)?;
    Ok(image)
}

fn place(element: &HtmlElement, position: Position) -> Result<(), HostError> {
    set_style(element, "left", &format!("{}px", position.left))?;
    set_style(element, "top", &format!("{}px", position.top))
}

fn set_style(element: &HtmlElement, property: &str, value: &str) -> Result<(), HostError> {
    element.style().set_property(property, value).map_err(HostError::js)
}
