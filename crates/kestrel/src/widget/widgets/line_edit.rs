//! Single-line text input widget.
//!
//! [`LineEdit`] wraps an [`EditBuffer`] with keyboard handling, a blinking
//! cursor and two signals:
//!
//! - [`LineEdit::TEXT_EDITED`] carries the full text after every edit made
//!   through the keyboard
//! - [`LineEdit::EDITING_FINISHED`] fires when Enter is pressed
//!
//! # Cursor Blinking
//!
//! The first time the widget gains focus it creates a child [`Timer`] with
//! an 800 ms interval. The timer runs while the widget has focus. Each
//! timeout toggles the cursor, unless the text was edited during the last
//! second, in which case the cursor stays visible.
//!
//! # Key Bindings
//!
//! | Key | Action |
//! |-----|--------|
//! | Left/Right | Move the cursor; with Shift, extend the selection |
//! | Home/End | Jump to the front or back; with Shift, extend the selection |
//! | Backspace/Delete | Delete the selection, or one character before/after the cursor |
//! | Ctrl+A | Select all |
//! | Enter | Emit `EDITING_FINISHED` |

use std::time::{Duration, Instant};

use kestrel_core::{
    Color, Event, FocusEvent, Key, KeyEvent, Object, ObjectContext, ObjectId, PaintEvent, Point,
    Rect, Signal, Size, Slot, Timer,
};
use kestrel_render::{Font, Painter, Pen};

use super::edit_buffer::EditBuffer;
use crate::widget::{Widget, WidgetBase, route_event};

const PADDING: f32 = 4.0;
const SELECTION_COLOR: Color = Color::new(0.6, 0.75, 1.0, 1.0);

/// A single-line text editor.
pub struct LineEdit {
    base: WidgetBase,
    buffer: EditBuffer,
    cursor_timer: Option<ObjectId>,
    cursor_visible: bool,
    last_change: Option<Instant>,
    font: Font,
    text_color: Color,
}

impl LineEdit {
    /// Emitted with the new text after each keyboard edit.
    pub const TEXT_EDITED: Signal<String> = Signal::new("text_edited");

    /// Emitted when Enter is pressed.
    pub const EDITING_FINISHED: Signal<()> = Signal::new("editing_finished");

    /// Blink period of the cursor.
    pub const CURSOR_INTERVAL: Duration = Duration::from_millis(800);

    /// How long the cursor stays solid after an edit.
    pub const CURSOR_HOLD: Duration = Duration::from_secs(1);

    /// Create an unfocused line edit holding `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            base: WidgetBase::new().with_size(Size::new(150.0, 25.0)),
            buffer: EditBuffer::new(text),
            cursor_timer: None,
            cursor_visible: false,
            last_change: None,
            font: Font::default(),
            text_color: Color::BLACK,
        }
    }

    /// Set the widget base (builder pattern).
    pub fn with_base(mut self, base: WidgetBase) -> Self {
        self.base = base;
        self
    }

    /// Set the font (builder pattern).
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    /// The edit state: cursor, selection and text.
    pub fn buffer(&self) -> &EditBuffer {
        &self.buffer
    }

    /// Replace the text. Does not emit [`LineEdit::TEXT_EDITED`].
    pub fn set_text(&mut self, ctx: &ObjectContext<'_>, text: impl Into<String>) {
        self.buffer.set_text(text);
        self.touch(ctx);
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    /// Whether the cursor is currently drawn.
    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    /// The blink timer, once the widget has been focused.
    pub fn cursor_timer(&self) -> Option<ObjectId> {
        self.cursor_timer
    }

    /// Record an edit: the cursor shows and holds, and a repaint is queued.
    fn touch(&mut self, ctx: &ObjectContext<'_>) {
        self.last_change = Some(ctx.now());
        if self.base.has_focus() {
            self.cursor_visible = true;
        }
        ctx.update();
    }

    fn text_edited(&mut self, ctx: &mut ObjectContext<'_>) {
        self.touch(ctx);
        ctx.emit(Self::TEXT_EDITED, self.buffer.text().to_owned());
    }

    fn on_cursor_timeout(&mut self, ctx: &mut ObjectContext<'_>) {
        let now = ctx.now();
        let idle = self
            .last_change
            .is_none_or(|changed| now.saturating_duration_since(changed) > Self::CURSOR_HOLD);
        if idle {
            self.cursor_visible = !self.cursor_visible;
            ctx.update();
        }
    }

    fn ensure_cursor_timer(&mut self, ctx: &mut ObjectContext<'_>) -> Option<ObjectId> {
        if let Some(timer) = self.cursor_timer
            && ctx.is_live(timer)
        {
            return Some(timer);
        }
        let me = ctx.id();
        let timer = match ctx.create_child(me, Timer::new(Self::CURSOR_INTERVAL)) {
            Ok(timer) => timer,
            Err(error) => {
                tracing::debug!(target: "kestrel::widget", id = ?me, %error, "cannot create cursor timer");
                return None;
            }
        };
        ctx.connect(
            timer,
            Timer::TIMEOUT,
            me,
            Slot::new("on_cursor_timeout", |edit: &mut LineEdit, ctx, _: &()| {
                edit.on_cursor_timeout(ctx)
            }),
        );
        self.cursor_timer = Some(timer);
        Some(timer)
    }

    fn start_cursor(&mut self, ctx: &mut ObjectContext<'_>) {
        self.cursor_visible = true;
        if let Some(timer) = self.ensure_cursor_timer(ctx)
            && let Err(error) = Timer::start(ctx, timer)
        {
            tracing::debug!(target: "kestrel::widget", id = ?ctx.id(), %error, "cursor timer not started");
        }
        ctx.update();
    }

    fn stop_cursor(&mut self, ctx: &mut ObjectContext<'_>) {
        self.cursor_visible = false;
        if let Some(timer) = self.cursor_timer
            && let Err(error) = Timer::stop(ctx, timer)
        {
            tracing::trace!(target: "kestrel::widget", id = ?ctx.id(), %error, "cursor timer already gone");
        }
        ctx.update();
    }

    /// Move horizontally, extending the selection when `extend` is set.
    fn navigate(&mut self, extend: bool, apply: impl FnOnce(&mut EditBuffer)) {
        if extend {
            self.buffer.enable_selection_mode(true);
        } else if self.buffer.is_selection_mode() {
            self.buffer.enable_selection_mode(false);
        }
        apply(&mut self.buffer);
    }

    fn delete(&mut self, ctx: &mut ObjectContext<'_>, after: bool) {
        let changed = if self.buffer.has_selection() {
            self.buffer.delete_selection()
        } else {
            self.buffer.enable_selection_mode(false);
            self.buffer.remove_text(1, after) > 0
        };
        if changed {
            self.text_edited(ctx);
        }
    }

    fn insert(&mut self, ctx: &mut ObjectContext<'_>, text: &str) {
        let text: String = text.chars().filter(|c| !c.is_control()).collect();
        if text.is_empty() {
            return;
        }
        self.buffer.add_text(&text);
        self.buffer.enable_selection_mode(false);
        self.text_edited(ctx);
    }
}

impl Object for LineEdit {
    fn event(&mut self, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
        route_event(self, ctx, event)
    }
}

impl Widget for LineEdit {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }

    fn widget_base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn paint_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &PaintEvent, painter: &mut dyn Painter) {
        let rect = self.base.rect();
        let focused = self.base.has_focus();
        painter.fill_rect(rect, self.base.background());
        let frame = if focused { Color::BLACK } else { Color::GRAY };
        painter.draw_rect(rect.inset(0.5), Pen::new(frame, 1.0));

        let top = ((rect.height() - self.font.size) / 2.0).max(0.0);
        if self.buffer.has_selection() {
            let x0 = PADDING
                + painter.text_width(self.buffer.text_range(0, self.buffer.selection_start()), &self.font);
            let x1 = PADDING
                + painter.text_width(self.buffer.text_range(0, self.buffer.selection_end()), &self.font);
            painter.fill_rect(Rect::new(x0, top, x1 - x0, self.font.size), SELECTION_COLOR);
        }
        if !self.buffer.is_empty() {
            painter.draw_text(self.buffer.text(), Point::new(PADDING, top), &self.font, self.text_color);
        }
        if focused && self.cursor_visible && !self.buffer.has_selection() {
            let x = PADDING + painter.text_width(self.buffer.text_to_cursor(), &self.font);
            painter.draw_line(
                Point::new(x, top),
                Point::new(x, top + self.font.size),
                Pen::new(self.text_color, 1.0),
            );
        }
    }

    fn focus_event(&mut self, ctx: &mut ObjectContext<'_>, event: &FocusEvent) {
        if event.focused {
            self.start_cursor(ctx);
        } else {
            self.stop_cursor(ctx);
        }
    }

    fn key_press_event(&mut self, ctx: &mut ObjectContext<'_>, event: &KeyEvent) {
        let shift = event.modifiers.shift;
        let ctrl = event.modifiers.control || event.modifiers.meta;

        match event.key {
            // Navigation
            Key::ArrowLeft => self.navigate(shift, |b| b.move_cursor_left(1)),
            Key::ArrowRight => self.navigate(shift, |b| b.move_cursor_right(1)),
            Key::Home if shift => self.navigate(true, EditBuffer::move_selection_to_front),
            Key::Home => self.navigate(false, EditBuffer::move_cursor_to_front),
            Key::End if shift => self.navigate(true, EditBuffer::move_selection_to_back),
            Key::End => self.navigate(false, EditBuffer::move_cursor_to_back),

            // Deletion
            Key::Backspace => {
                self.delete(ctx, false);
                return;
            }
            Key::Delete => {
                self.delete(ctx, true);
                return;
            }

            Key::A if ctrl => {
                self.buffer.select_all();
                self.cursor_visible = false;
                ctx.update();
                return;
            }

            Key::Enter => {
                ctx.emit(Self::EDITING_FINISHED, ());
                return;
            }

            // Character input
            _ => {
                if !event.text.is_empty() && !ctrl && !event.modifiers.alt {
                    let text = event.text.clone();
                    self.insert(ctx, &text);
                }
                return;
            }
        }
        self.touch(ctx);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use kestrel_core::{
        Application, ApplicationConfig, HeadlessPlatform, KeyboardModifiers, ManualClock,
    };

    #[derive(Default)]
    struct Form {
        edits: Vec<String>,
        finished: u32,
    }

    impl Object for Form {}

    struct Fixture {
        app: Application,
        clock: ManualClock,
        edit: ObjectId,
        form: ObjectId,
    }

    fn setup(text: &str) -> Fixture {
        let clock = ManualClock::new();
        let mut app = Application::with_options(
            HeadlessPlatform::new(),
            ApplicationConfig::default(),
            Arc::new(clock.clone()),
        );
        let edit = app.create_root(LineEdit::new(text));
        let form = app.create_root(Form::default());
        let graph = app.graph_mut();
        graph.connect(
            edit,
            LineEdit::TEXT_EDITED,
            form,
            Slot::new("on_edited", |f: &mut Form, _ctx, text: &String| f.edits.push(text.clone())),
        );
        graph.connect(
            edit,
            LineEdit::EDITING_FINISHED,
            form,
            Slot::new("on_finished", |f: &mut Form, _ctx, _: &()| f.finished += 1),
        );
        Fixture {
            app,
            clock,
            edit,
            form,
        }
    }

    impl Fixture {
        fn send(&mut self, mut event: Event) {
            self.app.graph_mut().send_event(self.edit, &mut event);
        }

        fn key(&mut self, key: Key) {
            self.send(Event::Key(KeyEvent::press(key)));
        }

        fn key_with(&mut self, key: Key, modifiers: KeyboardModifiers) {
            self.send(Event::Key(KeyEvent::press(key).with_modifiers(modifiers)));
        }

        fn type_text(&mut self, text: &str) {
            self.send(Event::Key(KeyEvent::text(Key::Other(0), text)));
        }

        fn focus(&mut self, focused: bool) {
            self.send(Event::Focus(FocusEvent { focused }));
        }

        fn line_edit(&self) -> &LineEdit {
            self.app.graph().object::<LineEdit>(self.edit).unwrap()
        }

        fn form(&self) -> &Form {
            self.app.graph().object::<Form>(self.form).unwrap()
        }

        fn tick(&mut self, ms: u64) {
            self.clock.advance(Duration::from_millis(ms));
            self.app.process_events();
        }
    }

    #[test]
    fn test_typing_emits_text_edited() {
        let mut f = setup("");
        f.type_text("hi");
        f.type_text("!");
        assert_eq!(f.line_edit().text(), "hi!");
        assert_eq!(f.form().edits, vec!["hi".to_string(), "hi!".to_string()]);
    }

    #[test]
    fn test_control_characters_are_filtered() {
        let mut f = setup("");
        f.type_text("\u{8}");
        assert!(f.form().edits.is_empty());
        assert_eq!(f.line_edit().text(), "");
    }

    #[test]
    fn test_navigation_and_deletion() {
        let mut f = setup("abcd");
        f.key(Key::End);
        f.key(Key::ArrowLeft);
        f.key(Key::Backspace);
        assert_eq!(f.line_edit().text(), "abd");
        f.key(Key::Home);
        f.key(Key::Delete);
        assert_eq!(f.line_edit().text(), "bd");
        assert_eq!(f.form().edits, vec!["abd".to_string(), "bd".to_string()]);

        f.key(Key::Home);
        f.key(Key::Backspace);
        assert_eq!(f.form().edits.len(), 2);
    }

    #[test]
    fn test_shift_extends_selection() {
        let mut f = setup("hello");
        f.key_with(Key::ArrowRight, KeyboardModifiers::SHIFT);
        f.key_with(Key::ArrowRight, KeyboardModifiers::SHIFT);
        assert_eq!(f.line_edit().buffer().selected_text(), "he");

        f.key(Key::Backspace);
        assert_eq!(f.line_edit().text(), "llo");
        assert!(!f.line_edit().buffer().is_selection_mode());

        f.key_with(Key::End, KeyboardModifiers::SHIFT);
        assert_eq!(f.line_edit().buffer().selected_text(), "llo");
        f.key(Key::ArrowLeft);
        assert!(!f.line_edit().buffer().has_selection());
    }

    #[test]
    fn test_select_all_then_type_replaces() {
        let mut f = setup("old");
        f.key_with(Key::A, KeyboardModifiers::CTRL);
        assert_eq!(f.line_edit().buffer().selected_text(), "old");
        f.type_text("new");
        assert_eq!(f.line_edit().text(), "new");
    }

    #[test]
    fn test_enter_finishes_editing() {
        let mut f = setup("done");
        f.key(Key::Enter);
        assert_eq!(f.form().finished, 1);
        assert!(f.form().edits.is_empty());
    }

    #[test]
    fn test_cursor_blinks_only_while_focused() {
        let mut f = setup("abc");
        assert!(f.line_edit().cursor_timer().is_none());

        f.focus(true);
        let timer = f.line_edit().cursor_timer().unwrap();
        assert!(Timer::is_active(f.app.graph(), timer));
        assert!(f.line_edit().is_cursor_visible());

        f.tick(800);
        assert!(!f.line_edit().is_cursor_visible());
        f.tick(800);
        assert!(f.line_edit().is_cursor_visible());

        f.focus(false);
        assert!(!Timer::is_active(f.app.graph(), timer));
        f.tick(1600);
        assert!(!f.line_edit().is_cursor_visible());

        f.focus(true);
        assert_eq!(f.line_edit().cursor_timer(), Some(timer));
    }

    #[test]
    fn test_cursor_holds_after_edit() {
        let mut f = setup("");
        f.focus(true);
        f.tick(400);
        f.type_text("x");

        f.tick(400);
        assert!(f.line_edit().is_cursor_visible());
        f.tick(800);
        assert!(!f.line_edit().is_cursor_visible());
    }

    #[test]
    fn test_timer_is_destroyed_with_the_edit() {
        let mut f = setup("abc");
        f.focus(true);
        let timer = f.line_edit().cursor_timer().unwrap();
        f.app.graph_mut().destroy(f.edit);
        assert!(!f.app.graph().contains(timer));
        assert_eq!(f.app.event_queue().active_timers(), 0);
    }
}
