//! Standard widgets for Kestrel.
//!
//! - [`Button`]: Image button with checkable, push and click behaviour
//! - [`LineEdit`]: Single-line text input with a blinking cursor
//! - [`EditBuffer`]: The text, cursor and selection model behind `LineEdit`

mod button;
mod edit_buffer;
mod line_edit;

pub use button::{Button, ButtonImage, ButtonType};
pub use edit_buffer::EditBuffer;
pub use line_edit::LineEdit;
