//! Console presentation for tailscope
//!
//! This crate provides the thin shell around the log engine: entry
//! rendering, colors, keybindings, the pager, live tail output and the
//! session object the shell passes between commands.

pub mod event;
pub mod keys;
pub mod pager;
pub mod render;
pub mod session;
pub mod status_bar;
pub mod tail_view;
pub mod terminal;
pub mod theme;

pub use event::{Event, EventHandler};
pub use keys::{ConsoleAction, KeyBinding, KeyBindings, KeyContext};
pub use pager::{PageState, Pager};
pub use render::EntryRenderer;
pub use session::Session;
pub use status_bar::{StatusBar, pager_hints, tail_hints};
pub use tail_view::{TailOptions, run_tail};
pub use terminal::RawMode;
pub use theme::Theme;
