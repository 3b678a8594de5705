#![forbid(unsafe_code)]

//! Core: geometry, pointer events, configuration, and logging.
//!
//! # Role in TaskDeck
//! `taskdeck-core` is the input layer. It owns the geometric primitives the
//! collision resolver works on, the normalized pointer events the drag
//! controller consumes, and the configuration/logging bootstrap shared by the
//! other crates.
//!
//! # How it fits in the system
//! `taskdeck-board` owns the task collection and membership index;
//! `taskdeck-dnd` turns `taskdeck-core::event::PointerEvent` values into drag
//! sessions and mutation intents. Neither depends on a UI toolkit: hosts
//! translate their native input and layout into these types.

pub mod config;
pub mod event;
pub mod geometry;
pub mod logging;

pub use config::{BoardConfig, ConfigError, DragConfig, LogConfig, LogFormat};
pub use event::{PointerEvent, PointerEventKind, PointerId};
pub use geometry::{Point, Rect};

// Re-export tracing macros at crate root for ergonomic use.
pub use logging::{debug, debug_span, error, info, info_span, trace, warn};
