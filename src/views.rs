//! HTML views.
//!
//! Every `*.html` file in the template directory is registered under its
//! file name when the process starts. A missing directory, a missing
//! required view or a syntax error aborts startup; nothing is parsed on the
//! request path.

use std::path::Path;

use minijinja::Environment;
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

pub const INDEX: &str = "index.html";
pub const COMPONENTS: &str = "components.html";

const REQUIRED: [&str; 2] = [INDEX, COMPONENTS];

/// Parsed templates, ready to render.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    /// Loads and parses every `*.html` file in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut env = Environment::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let source = std::fs::read_to_string(&path)?;
            debug!(template = name, "registering view");
            env.add_template_owned(name.to_owned(), source)?;
        }

        for name in REQUIRED {
            if env.get_template(name).is_err() {
                return Err(Error::MissingTemplate { name, dir: dir.to_path_buf() });
            }
        }

        Ok(Self { env })
    }

    /// Renders the view registered as `name`. Output is HTML-escaped.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use minijinja::context;

    use super::*;

    fn write_views(dir: &Path, components: &str) {
        std::fs::write(dir.join(INDEX), "<h1>{{ title }}</h1>").unwrap();
        std::fs::write(dir.join(COMPONENTS), components).unwrap();
    }

    #[test]
    fn renders_registered_view() {
        let dir = tempfile::tempdir().unwrap();
        write_views(dir.path(), "{% for c in components %}<li>{{ c.name }}</li>{% endfor %}");

        let views = Views::load(dir.path()).unwrap();
        let html = views.render(INDEX, context! { title => "Parts" }).unwrap();
        assert_eq!(html, "<h1>Parts</h1>");
    }

    #[test]
    fn escapes_html_in_values() {
        let dir = tempfile::tempdir().unwrap();
        write_views(dir.path(), "");

        let views = Views::load(dir.path()).unwrap();
        let html = views.render(INDEX, context! { title => "<b>" }).unwrap();
        assert_eq!(html, "<h1>&lt;b&gt;</h1>");
    }

    #[test]
    fn ignores_non_html_files() {
        let dir = tempfile::tempdir().unwrap();
        write_views(dir.path(), "");
        std::fs::write(dir.path().join("notes.txt"), "{% broken").unwrap();

        assert!(Views::load(dir.path()).is_ok());
    }

    #[test]
    fn missing_required_view_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX), "home").unwrap();

        let err = Views::load(dir.path()).err().unwrap();
        assert!(matches!(err, Error::MissingTemplate { name: COMPONENTS, .. }));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Views::load(&dir.path().join("nope")).err().unwrap();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn syntax_error_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_views(dir.path(), "{% for c in %}");

        let err = Views::load(dir.path()).err().unwrap();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn shipped_templates_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
        assert!(Views::load(&dir).is_ok());
    }
}
