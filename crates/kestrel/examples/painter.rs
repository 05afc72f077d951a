//! Kestrel Painter Example
//!
//! A canvas that draws a dot wherever it is clicked, plus a button that
//! clears it. The run is scripted on the headless platform: a few clicks,
//! a press on the clear button, more clicks, then a close request. Each
//! recorded paint frame is printed.
//!
//! Run with: cargo run -p kestrel --example painter
//! Set `RUST_LOG=kestrel_core=debug` to see the dispatch loop.

use std::process::ExitCode;

use kestrel::prelude::*;
use kestrel::render::DrawCommand;
use tracing_subscriber::EnvFilter;

const DOT_RADIUS: f32 = 4.0;

/// Top-level window holding the dots drawn so far.
struct Canvas {
    base: WidgetBase,
    dots: Vec<Point>,
}

impl Canvas {
    fn new() -> Self {
        Self {
            base: WidgetBase::new().with_background(Color::WHITE),
            dots: Vec::new(),
        }
    }

    fn clear(&mut self, ctx: &mut ObjectContext<'_>) {
        self.dots.clear();
        ctx.update();
    }
}

impl Object for Canvas {
    fn event(&mut self, ctx: &mut ObjectContext<'_>, event: &mut Event) -> bool {
        route_event(self, ctx, event)
    }
}

impl Widget for Canvas {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }

    fn widget_base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn paint_event(&mut self, _ctx: &mut ObjectContext<'_>, _event: &PaintEvent, painter: &mut dyn Painter) {
        painter.fill_rect(self.base.rect(), self.base.background());
        for dot in &self.dots {
            painter.draw_circle(*dot, DOT_RADIUS, Pen::new(Color::BLUE, 2.0));
        }
    }

    fn mouse_button_press_event(&mut self, ctx: &mut ObjectContext<'_>, event: &MouseButtonEvent) {
        if event.button == MouseButton::Left {
            self.dots.push(event.position);
            ctx.update();
        }
    }
}

fn click(at: Point) -> [Event; 2] {
    [
        Event::MouseButton(MouseButtonEvent::press(MouseButton::Left, at)),
        Event::MouseButton(MouseButtonEvent::release(MouseButton::Left, at)),
    ]
}

/// Run the scripted input, then the repaint it queued.
fn settle(app: &mut Application) {
    app.process_events();
    app.process_events();
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let platform = HeadlessPlatform::new();
    let input = platform.handle();
    let mut app = Application::new(platform);

    let canvas = app.create_root(Canvas::new());
    let clear = match app
        .graph_mut()
        .create_child(canvas, Button::new().with_base(WidgetBase::new().with_size(Size::new(60.0, 20.0))))
    {
        Ok(id) => id,
        Err(error) => {
            tracing::error!(%error, "cannot create clear button");
            return ExitCode::FAILURE;
        }
    };
    app.graph_mut().connect(
        clear,
        Button::CLICKED,
        canvas,
        Slot::new("clear", |canvas: &mut Canvas, ctx, _: &()| canvas.clear(ctx)),
    );

    if !app.set_top_level_window(canvas) {
        return ExitCode::FAILURE;
    }
    if let Err(error) = app.graph_mut().with_object::<Canvas, _>(canvas, |canvas, ctx| {
        canvas.base.set_title(ctx, "Kestrel Painter");
        canvas.base.show(ctx);
    }) {
        tracing::error!(%error, "cannot show canvas");
        return ExitCode::FAILURE;
    }

    for at in [Point::new(20.0, 30.0), Point::new(80.0, 40.0), Point::new(120.0, 200.0)] {
        for event in click(at) {
            input.inject(event);
        }
    }
    settle(&mut app);

    for event in click(Point::new(10.0, 10.0)) {
        input.inject_to(clear, event);
    }
    settle(&mut app);

    for event in click(Point::new(200.0, 200.0)) {
        input.inject(event);
    }
    settle(&mut app);

    input.inject(Event::close());
    let code = app.exec();

    for frame in input.paint_frames() {
        let dots = frame
            .commands
            .iter()
            .filter(|command| matches!(command, DrawCommand::Circle { .. }))
            .count();
        println!("frame for {:?}: {} commands, {} dots", frame.target, frame.commands.len(), dots);
    }
    println!("exit code: {code}");

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
