use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::Config;
use crate::consts::ID_GENERATION_ATTEMPTS;
use crate::geometry::{Point, Position};
use crate::id::ImageId;
use crate::input::{Button, DragState, Key};
use crate::paste::{PasteOpId, PasteTicket, PasteTracker, is_image_type};
use crate::records::Records;
use crate::selection::Selection;
use crate::store::KeyValueStore;
use crate::throttle::{Clock, Throttle};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// DOM mutations returned from input handlers for the host to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Create an image element showing `src` at `position` and append it to the container.
    ImageCreated { id: ImageId, src: String, position: Position },
    /// Move an existing image element.
    ImageMoved { id: ImageId, position: Position },
    /// Remove an image element.
    ImageRemoved { id: ImageId },
    /// Apply the selection marker.
    SelectionMarked { id: ImageId },
    /// Remove the selection marker.
    SelectionCleared { id: ImageId },
    /// A drag gesture began; the host attaches its move/up listeners.
    DragStarted { id: ImageId },
    /// A drag gesture ended and `position` was persisted; the host detaches its listeners.
    DragEnded { id: ImageId, position: Position },
    /// A drag gesture was abandoned without persisting; the host detaches its listeners.
    DragCancelled { id: ImageId },
}

/// Core canvas state: everything that doesn't depend on the DOM.
///
/// Separated from the browser host so it can be tested natively against a
/// [`crate::store::MemoryStore`] and a [`crate::throttle::ManualClock`].
pub struct EngineCore<S, C> {
    config: Config,
    records: Records<S>,
    clock: C,
    rng: StdRng,
    throttle: Throttle,
    /// Last admitted pointer position, document coordinates.
    pointer: Point,
    selection: Selection,
    drag: DragState,
    pastes: PasteTracker,
    /// Images currently on the canvas and where they are.
    placed: BTreeMap<ImageId, Position>,
}

impl<S: KeyValueStore, C: Clock> EngineCore<S, C> {
    /// Create an engine over `store`, seeding id generation with `seed`.
    pub fn new(config: Config, store: S, clock: C, seed: u64) -> Self {
        let records = Records::new(store, config.key_scheme());
        let throttle = Throttle::new(config.pointer_throttle_ms);
        Self {
            config,
            records,
            clock,
            rng: StdRng::seed_from_u64(seed),
            throttle,
            pointer: Point::default(),
            selection: Selection::default(),
            drag: DragState::Idle,
            pastes: PasteTracker::default(),
            placed: BTreeMap::new(),
        }
    }

    // --- Startup ---

    /// Run the integrity pass and place every stored image.
    pub fn load_all(&mut self) -> Vec<Action> {
        let images = match self.records.load_all() {
            Ok(images) => images,
            Err(err) => {
                log::error!("failed to load images from storage: {err}");
                return Vec::new();
            }
        };
        let mut actions = Vec::with_capacity(images.len());
        for image in images {
            if self.placed.contains_key(&image.id) {
                continue;
            }
            self.placed.insert(image.id.clone(), image.position);
            actions.push(Action::ImageCreated { id: image.id, src: image.data_url, position: image.position });
        }
        log::debug!("loaded {} images", actions.len());
        actions
    }

    // --- Pointer ---

    /// Record the pointer position, at most once per throttle window.
    ///
    /// Returns whether the sample was admitted.
    pub fn track_pointer(&mut self, client: Point, scroll: Point) -> bool {
        if !self.throttle.admit(self.clock.now_ms()) {
            return false;
        }
        self.pointer = client.to_document(scroll);
        true
    }

    /// Pointer pressed over `target` (an image) or over nothing.
    ///
    /// Clears a selection the press lands outside of, then starts a drag when
    /// an image is pressed with the primary button.
    pub fn on_pointer_down(&mut self, target: Option<&ImageId>, button: Button, client: Point, scroll: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(id) = self.selection.clear_unless(target) {
            actions.push(Action::SelectionCleared { id });
        }

        let Some(id) = target else {
            return actions;
        };
        if button != Button::Primary {
            return actions;
        }
        let Some(origin) = self.placed.get(id).copied() else {
            log::warn!("pointer down on unknown image {id}");
            return actions;
        };
        match self.drag.begin(id.clone(), origin, client.to_document(scroll)) {
            Ok(()) => actions.push(Action::DragStarted { id: id.clone() }),
            Err(err) => log::warn!("{err}"),
        }
        actions
    }

    /// Pointer moved during a drag.
    pub fn drag_to(&mut self, client: Point, scroll: Point) -> Vec<Action> {
        let Some((id, position)) = self.drag.update(client.to_document(scroll)) else {
            return Vec::new();
        };
        self.placed.insert(id.clone(), position);
        vec![Action::ImageMoved { id, position }]
    }

    /// Pointer released: persist where the dragged image ended up.
    pub fn end_drag(&mut self) -> Vec<Action> {
        let Some((id, position)) = self.drag.finish() else {
            return Vec::new();
        };
        if let Err(err) = self.records.save_position(&id, position) {
            log::error!("failed to save position of {id}: {err}");
        }
        vec![Action::DragEnded { id, position }]
    }

    /// Click on `target` toggles its selection.
    pub fn on_click(&mut self, target: Option<&ImageId>) -> Vec<Action> {
        let Some(id) = target else {
            return Vec::new();
        };
        if !self.placed.contains_key(id) {
            return Vec::new();
        }
        let change = self.selection.toggle(id);
        let mut actions = Vec::new();
        if let Some(id) = change.cleared {
            actions.push(Action::SelectionCleared { id });
        }
        if let Some(id) = change.marked {
            actions.push(Action::SelectionMarked { id });
        }
        actions
    }

    // --- Keyboard ---

    /// A delete key removes the selected image and both of its records.
    pub fn on_key_down(&mut self, key: &Key) -> Vec<Action> {
        if !self.config.is_delete_key(&key.0) {
            return Vec::new();
        }
        let Some(id) = self.selection.clear() else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        if self.drag.dragged() == Some(&id) {
            self.drag = DragState::Idle;
            actions.push(Action::DragCancelled { id: id.clone() });
        }
        if let Err(err) = self.records.remove(&id) {
            log::error!("failed to remove records of {id}: {err}");
        }
        self.placed.remove(&id);
        actions.push(Action::ImageRemoved { id });
        actions
    }

    // --- Paste ---

    /// Register one paste operation per image item in `item_types`.
    ///
    /// An empty result means nothing in the clipboard is an image and the
    /// default paste should go ahead.
    pub fn begin_paste<T: AsRef<str>>(&mut self, item_types: &[T]) -> Vec<PasteTicket> {
        let position = Position::from(self.pointer);
        let mut tickets = Vec::new();
        for (item_index, mime) in item_types.iter().enumerate() {
            if is_image_type(mime.as_ref()) {
                tickets.push(PasteTicket { op: self.pastes.begin(), item_index, position });
            }
        }
        tickets
    }

    /// The image for `ticket` has been read as `data_url`: persist and place it.
    pub fn complete_paste(&mut self, ticket: &PasteTicket, data_url: String) -> Vec<Action> {
        if !self.pastes.finish(ticket.op) {
            log::debug!("{} is no longer pending, dropping its image", ticket.op);
            return Vec::new();
        }
        let Some(id) = self.fresh_id() else {
            return Vec::new();
        };
        if let Err(err) = self.records.save_image(&id, &data_url) {
            log::error!("failed to store pasted image {id}: {err}");
            return Vec::new();
        }

        let position = ticket.position;
        self.placed.insert(id.clone(), position);
        if let Err(err) = self.records.save_position(&id, position) {
            log::error!("failed to save position of {id}: {err}");
        }
        log::debug!("pasted image {id} at ({}, {})", position.left, position.top);
        vec![Action::ImageCreated { id, src: data_url, position }]
    }

    /// The read for `ticket` failed.
    pub fn fail_paste(&mut self, ticket: &PasteTicket, reason: &str) {
        if self.pastes.finish(ticket.op) {
            log::warn!("{} failed to read clipboard item {}: {reason}", ticket.op, ticket.item_index);
        }
    }

    /// Cancel all pending paste operations, returning their ids.
    pub fn cancel_pastes(&mut self) -> Vec<PasteOpId> {
        let cancelled = self.pastes.cancel_all();
        if !cancelled.is_empty() {
            log::debug!("cancelled {} pending pastes", cancelled.len());
        }
        cancelled
    }

    fn fresh_id(&mut self) -> Option<ImageId> {
        for _ in 0..ID_GENERATION_ATTEMPTS {
            let id = ImageId::generate(&mut self.rng, self.config.id_length);
            if self.placed.contains_key(&id) {
                continue;
            }
            match self.records.has_image(&id) {
                Ok(false) => return Some(id),
                Ok(true) => {}
                Err(err) => {
                    log::error!("failed to check id {id}: {err}");
                    return None;
                }
            }
        }
        log::error!("no free image id after {ID_GENERATION_ATTEMPTS} attempts");
        None
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Last admitted pointer position, document coordinates.
    #[must_use]
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// The currently selected image, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&ImageId> {
        self.selection.selected()
    }

    /// The image being dragged, if any.
    #[must_use]
    pub fn dragged(&self) -> Option<&ImageId> {
        self.drag.dragged()
    }

    /// Where image `id` is on the canvas.
    #[must_use]
    pub fn position(&self, id: &ImageId) -> Option<Position> {
        self.placed.get(id).copied()
    }

    /// Ids of all images on the canvas.
    pub fn images(&self) -> impl Iterator<Item = &ImageId> {
        self.placed.keys()
    }

    #[must_use]
    pub fn pending_pastes(&self) -> usize {
        self.pastes.pending_count()
    }

    #[must_use]
    pub fn records(&self) -> &Records<S> {
        &self.records
    }
}
