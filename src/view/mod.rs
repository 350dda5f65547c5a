//! View subsystem.
//!
//! # Data Flow
//! ```text
//! Context::render (template name, format, layout choice, assigns)
//!     → finder (layouts → shared → <ShortName>, first hit wins)
//!     → template.rs (substitute {{ name }} from assigns)
//!     → layout wrapping at {{ content_for_layout }} (html only)
//!     → String body
//! ```
//!
//! # Design Decisions
//! - Templates are plain files; there is no compilation step or cache
//! - The default layout applies only when its file exists
//! - An explicitly chosen layout must exist
//! - `js` responses never use a layout

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::config::ViewConfig;

pub mod template;

/// Variables available to templates.
pub type Assigns = IndexMap<String, Value>;

/// Directories searched, in order, before the controller's own.
pub const SEARCH_DIRS: [&str; 2] = ["layouts", "shared"];

/// Assign holding the rendered action inside a layout.
pub const CONTENT_FOR_LAYOUT: &str = "content_for_layout";

/// Response format chosen by content negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Html,
    Js,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Js => "js",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Html => "text/html; charset=utf-8",
            Format::Js => "text/javascript; charset=utf-8",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which layout wraps a rendered template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// The configured default, if its file exists.
    Default,
    /// A specific layout that must exist.
    Named(String),
    None,
}

/// Errors raised while locating or reading templates.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("missing template `{name}` (searched: {})", display_paths(.searched))]
    MissingTemplate { name: String, searched: Vec<PathBuf> },

    #[error("failed to read template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Template finder and renderer rooted at one directory.
#[derive(Debug, Clone)]
pub struct View {
    root: PathBuf,
    default_layout: String,
}

impl View {
    pub fn new(root: impl Into<PathBuf>, default_layout: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            default_layout: default_layout.into(),
        }
    }

    pub fn from_config(config: &ViewConfig) -> Self {
        Self::new(config.root.clone(), config.default_layout.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate files for `name`, in search order.
    pub fn candidates(&self, name: &str, short_name: &str, format: Format) -> Vec<PathBuf> {
        let file = format!("{}.{}", name, format.extension());
        if name.contains('/') {
            return vec![self.root.join(file)];
        }
        let mut dirs: Vec<&str> = SEARCH_DIRS.to_vec();
        dirs.push(short_name);
        dirs.into_iter()
            .map(|dir| self.root.join(dir).join(&file))
            .collect()
    }

    /// Locate `name`; the first existing candidate wins.
    pub fn find_template(
        &self,
        name: &str,
        short_name: &str,
        format: Format,
    ) -> Result<PathBuf, ViewError> {
        let searched = self.candidates(name, short_name, format);
        match searched.iter().find(|path| path.is_file()) {
            Some(path) => Ok(path.clone()),
            None => Err(ViewError::MissingTemplate {
                name: name.to_string(),
                searched,
            }),
        }
    }

    /// Render `name` with `assigns`, wrapped in `layout` for html.
    pub fn render(
        &self,
        name: &str,
        short_name: &str,
        format: Format,
        layout: &Layout,
        assigns: &Assigns,
    ) -> Result<String, ViewError> {
        let path = self.find_template(name, short_name, format)?;
        let content = template::render_file(&path, assigns)?;

        if format == Format::Js {
            return Ok(content);
        }

        let layout_path = match layout {
            Layout::None => None,
            Layout::Named(layout) => Some(self.layout_path(layout)?),
            Layout::Default => self.layout_path(&self.default_layout).ok(),
        };

        match layout_path {
            Some(path) => {
                let mut assigns = assigns.clone();
                assigns.insert(CONTENT_FOR_LAYOUT.to_string(), Value::String(content));
                template::render_file(&path, &assigns)
            }
            None => Ok(content),
        }
    }

    fn layout_path(&self, layout: &str) -> Result<PathBuf, ViewError> {
        let path = self.root.join("layouts").join(format!("{}.html", layout));
        if path.is_file() {
            Ok(path)
        } else {
            Err(ViewError::MissingTemplate {
                name: format!("layouts/{}", layout),
                searched: vec![path],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_search_order() {
        let dir = tempfile::tempdir().unwrap();
        let view = View::new(dir.path(), "application");
        write(dir.path(), "Users/index.html", "own");
        write(dir.path(), "shared/index.html", "shared");

        let found = view.find_template("index", "Users", Format::Html).unwrap();
        assert_eq!(found, dir.path().join("shared/index.html"));

        write(dir.path(), "layouts/index.html", "layout");
        let found = view.find_template("index", "Users", Format::Html).unwrap();
        assert_eq!(found, dir.path().join("layouts/index.html"));
    }

    #[test]
    fn test_name_with_directory_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let view = View::new(dir.path(), "application");
        assert_eq!(
            view.candidates("posts/show", "Users", Format::Html),
            vec![dir.path().join("posts/show.html")]
        );
    }

    #[test]
    fn test_missing_template_lists_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let view = View::new(dir.path(), "application");
        let err = view.find_template("show", "Users", Format::Js).unwrap_err();
        match err {
            ViewError::MissingTemplate { name, searched } => {
                assert_eq!(name, "show");
                assert_eq!(searched.len(), 3);
                assert!(searched[2].ends_with("Users/show.js"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let view = View::new(dir.path(), "application");
        write(dir.path(), "Users/index.html", "hi {{ name }}");
        write(dir.path(), "Users/index.js", "alert('{{ name }}')");

        let mut assigns = Assigns::new();
        assigns.insert("name".into(), Value::from("ann"));

        // No layout file yet: the default layout is skipped.
        let body = view
            .render("index", "Users", Format::Html, &Layout::Default, &assigns)
            .unwrap();
        assert_eq!(body, "hi ann");

        write(dir.path(), "layouts/application.html", "<main>{{ content_for_layout }}</main>");
        let body = view
            .render("index", "Users", Format::Html, &Layout::Default, &assigns)
            .unwrap();
        assert_eq!(body, "<main>hi ann</main>");

        let body = view
            .render("index", "Users", Format::Js, &Layout::Default, &assigns)
            .unwrap();
        assert_eq!(body, "alert('ann')");

        let err = view
            .render("index", "Users", Format::Html, &Layout::Named("admin".into()), &assigns)
            .unwrap_err();
        assert!(matches!(err, ViewError::MissingTemplate { .. }));
    }
}
