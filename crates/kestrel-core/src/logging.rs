//! Log targets and object-tree dumps.
//!
//! Kestrel instruments itself with `tracing` and never installs a
//! subscriber. Each subsystem logs under its own target, listed in
//! [`targets`], so a filter such as
//! `kestrel_core::signal=trace,kestrel_core::event_loop=info` narrows output
//! to the part under investigation:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("kestrel_core::signal=trace,kestrel=debug")
//!     .init();
//! ```
//!
//! [`ObjectTreeDebug`] renders the ownership tree of an [`ObjectGraph`] as
//! text, which is handy in a `debug!` line or a failing test:
//!
//! ```
//! use kestrel_core::logging::ObjectTreeDebug;
//! use kestrel_core::{Object, ObjectGraph};
//!
//! struct Panel;
//! impl Object for Panel {}
//!
//! let mut graph = ObjectGraph::new();
//! let root = graph.create(Panel);
//! graph.set_name(root, "window").unwrap();
//!
//! let tree = ObjectTreeDebug::new().format_subtree(&graph, root).unwrap();
//! assert!(tree.starts_with("window"));
//! ```

use std::fmt::Write as _;

use crate::error::Result;
use crate::object::{ObjectGraph, ObjectId};

/// `tracing` targets, one per subsystem.
pub mod targets {
    pub const CORE: &str = "kestrel_core";
    pub const OBJECT: &str = "kestrel_core::object";
    pub const SIGNAL: &str = "kestrel_core::signal";
    pub const QUEUE: &str = "kestrel_core::queue";
    pub const TIMER: &str = "kestrel_core::timer";
    pub const EVENT_LOOP: &str = "kestrel_core::event_loop";
    pub const PLATFORM: &str = "kestrel_core::platform";
    /// Used by the widget crate.
    pub const WIDGET: &str = "kestrel::widget";
}

/// How branches between a parent and its children are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// `|`, `+--` and `` `-- ``.
    Ascii,
    /// Box-drawing characters.
    #[default]
    Unicode,
    /// Indentation and a single dash, no guide lines.
    Compact,
}

impl TreeStyle {
    /// (continuing guide, middle child, last child)
    fn glyphs(self) -> (&'static str, &'static str, &'static str) {
        match self {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => (" ", "-", "-"),
        }
    }
}

/// What each line of a tree dump shows.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    pub style: TreeStyle,
    /// Append the object id.
    pub show_ids: bool,
    /// Append the short type name of the behaviour object.
    pub show_types: bool,
    /// Append the number of observers registered on the object.
    pub show_connections: bool,
    /// Deepest level printed; the root is level 0.
    pub max_depth: Option<usize>,
    /// Spaces after each guide line.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_types: true,
            show_connections: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Everything, including observer counts.
    pub fn detailed() -> Self {
        Self::default().with_connections(true)
    }

    /// Names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_types: false,
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_connections(mut self, show: bool) -> Self {
        self.show_connections = show;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}

/// Renders object trees as indented text.
#[derive(Debug, Clone, Default)]
pub struct ObjectTreeDebug {
    options: TreeFormatOptions,
}

impl ObjectTreeDebug {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Every root of `graph` and its descendants, under a one-line header.
    pub fn format_all(&self, graph: &ObjectGraph) -> Result<String> {
        let mut out = format!("Object Tree ({} total objects):\n", graph.object_count());
        let roots = graph.roots();
        if roots.is_empty() {
            out.push_str("  (empty)\n");
        }
        for root in roots {
            self.write_node(graph, root, 0, "", true, &mut out)?;
        }
        Ok(out)
    }

    /// `root` and its descendants.
    pub fn format_subtree(&self, graph: &ObjectGraph, root: ObjectId) -> Result<String> {
        let mut out = String::new();
        self.write_node(graph, root, 0, "", true, &mut out)?;
        Ok(out)
    }

    /// Write one line for `id`, then recurse. `guides` is the prefix owed to
    /// the ancestors: a guide line for each one that still has siblings below.
    fn write_node(
        &self,
        graph: &ObjectGraph,
        id: ObjectId,
        depth: usize,
        guides: &str,
        last: bool,
        out: &mut String,
    ) -> Result<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }
        let (guide, middle, corner) = self.options.style.glyphs();
        if depth > 0 {
            out.push_str(guides);
            out.push_str(if last { corner } else { middle });
            out.push(' ');
        }

        let name = graph.name(id)?;
        out.push_str(if name.is_empty() { "(unnamed)" } else { name });
        // fmt::Write into a String is infallible.
        if self.options.show_ids {
            let _ = write!(out, " [{id:?}]");
        }
        if self.options.show_types {
            let full = graph.type_name(id)?;
            let short = full.rsplit("::").next().unwrap_or(full);
            let _ = write!(out, " ({short})");
        }
        if self.options.show_connections {
            let _ = write!(out, " <{} out>", graph.observer_count(id));
        }
        if graph.is_destroying(id) {
            out.push_str(" *destroying*");
        }
        out.push('\n');

        let children = graph.children(id)?;
        let child_guides = if depth == 0 {
            String::new()
        } else {
            let pad = " ".repeat(self.options.indent_size);
            let continuing = if last { " " } else { guide };
            format!("{guides}{continuing}{pad}")
        };
        for (index, &child) in children.iter().enumerate() {
            let last_child = index + 1 == children.len();
            self.write_node(graph, child, depth + 1, &child_guides, last_child, out)?;
        }
        Ok(())
    }
}
