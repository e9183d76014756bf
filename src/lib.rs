//! Paste images onto a freeform page canvas and keep them across reloads.
//!
//! This crate is compiled to WebAssembly and runs in the browser. Pasting an
//! image from the clipboard drops it at the pointer; images can be dragged,
//! clicked to select, and deleted with Backspace/Delete. Each image's data URL
//! and position live in `localStorage` under `rhein-img-key-<id>` and
//! `rhein-img-position-<id>`, and are restored on the next page load after an
//! integrity pass discards corrupt position records.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Testable [`engine::EngineCore`] controller and the [`engine::Action`]s it emits |
//! | [`records`] | Image/Position Record persistence and the integrity pass |
//! | [`store`] | [`store::KeyValueStore`] seam and the in-memory store |
//! | [`input`] | Buttons, keys, and the drag gesture state machine |
//! | [`selection`] | Single-image selection |
//! | [`paste`] | Clipboard item classification and paste operation tracking |
//! | [`throttle`] | Leading-edge throttle and injectable clock |
//! | [`geometry`] | Viewport/document points and persisted positions |
//! | [`id`] | Image identifiers |
//! | [`config`] | Runtime configuration and storage key scheme |
//! | [`consts`] | Defaults (key prefixes, timings, element styling) |
//! | `browser` | DOM host and wasm entry points (feature `browser`) |

#[cfg(feature = "browser")]
pub mod browser;
pub mod config;
pub mod consts;
pub mod engine;
pub mod geometry;
pub mod id;
pub mod input;
pub mod paste;
pub mod records;
pub mod selection;
pub mod store;
pub mod throttle;
