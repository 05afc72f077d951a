//! Kestrel: a small cross-platform GUI widget toolkit.
//!
//! This is the umbrella crate. It re-exports the object/event core from
//! `kestrel-core`, the drawing types under [`render`], and adds the widget
//! layer in [`widget`].
//!
//! # Example
//!
//! ```
//! use kestrel::prelude::*;
//!
//! let platform = HeadlessPlatform::new();
//! let input = platform.handle();
//! let mut app = Application::new(platform);
//!
//! let edit = app.create_root(LineEdit::new(""));
//! assert!(app.set_top_level_window(edit));
//!
//! input.inject(Event::Key(KeyEvent::text(Key::K, "k")));
//! input.inject(Event::close());
//! assert_eq!(app.exec(), 0);
//! assert_eq!(app.graph().object::<LineEdit>(edit).unwrap().text(), "k");
//! ```

pub use kestrel_core::*;

/// Drawing primitives and painters.
pub mod render {
    pub use kestrel_render::*;
}

pub mod prelude;
pub mod widget;
