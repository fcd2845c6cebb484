//! The template composer and cache.
//!
//! Every page is composed once, at startup, from three layers:
//!
//! - one **base layout** whose `{% block %}` tags are named slots,
//! - any number of **partials**, whose blocks fill slots shared by all pages
//!   and whose bodies can be pulled in with `{% include "name.html" %}`,
//! - one **page** whose blocks fill slots for that page only.
//!
//! A slot is filled by the page if the page defines it, otherwise by a
//! partial, otherwise the base's default content is used. Content in pages
//! outside any block is ignored.
//!
//! The resulting [`TemplateCache`] is immutable and keyed by each page's
//! base file name (`pages/home.html` is `"home.html"`).

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use serde::Serialize;

use crate::context::Context;
use crate::error::{BuildError, RenderError, TemplateError};
use crate::filters::default_registry;
use crate::parser::{Node, Template};
use crate::render::{render_nodes, Composition, ResponseSink};

/// The name of the base layout inside a template directory.
pub const BASE_LAYOUT: &str = "base.html";

/// Raw template text with the name it was loaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    /// The source's name, usually its path.
    pub name: String,
    /// The template text.
    pub source: String,
}

impl TemplateSource {
    /// Creates a source from in-memory text.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Reads a source from disk, named by its path.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, BuildError> {
        let source = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.to_string_lossy(), source))
    }

    /// The file name with any directories stripped.
    pub fn base_name(&self) -> &str {
        Path::new(&self.name)
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or(&self.name)
    }

    fn compile(&self) -> Result<Template, BuildError> {
        let template =
            Template::compile(self.base_name(), &self.source).map_err(|source| {
                BuildError::Syntax {
                    name: self.name.clone(),
                    source,
                }
            })?;
        let registry = default_registry();
        if let Some(filter) = template
            .filter_names()
            .into_iter()
            .find(|name| !registry.contains(name))
        {
            return Err(BuildError::UnknownFilter {
                template: self.name.clone(),
                filter: filter.to_string(),
            });
        }
        Ok(template)
    }
}

/// The layers shared by every page.
#[derive(Debug)]
struct Layout {
    base: Template,
    partials: BTreeMap<String, Template>,
    partial_slots: HashMap<String, Vec<Node>>,
}

/// A composed page: the shared layout plus this page's slot fills.
#[derive(Debug)]
pub struct TemplateUnit {
    name: String,
    layout: Arc<Layout>,
    slots: HashMap<String, Vec<Node>>,
}

impl TemplateUnit {
    /// The page's base file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Executes the page against `context` into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Returns the first execution fault.
    pub fn execute(&self, context: &mut Context) -> Result<String, TemplateError> {
        let mut out = String::new();
        render_nodes(&self.layout.base.nodes, context, self, 0, &mut out)?;
        Ok(out)
    }
}

impl Composition for TemplateUnit {
    fn slot(&self, name: &str) -> Option<&[Node]> {
        self.slots
            .get(name)
            .or_else(|| self.layout.partial_slots.get(name))
            .map(Vec::as_slice)
    }

    fn partial(&self, name: &str) -> Option<&[Node]> {
        self.layout.partials.get(name).map(|t| t.nodes.as_slice())
    }
}

/// An immutable, name-addressable set of composed pages.
///
/// # Examples
///
/// ```
/// use snippetbox_template::{TemplateCache, TemplateSource};
///
/// let cache = TemplateCache::build(
///     TemplateSource::new("base.html", "<title>{% block title %}{% endblock %}</title>"),
///     vec![],
///     vec![TemplateSource::new("pages/home.html", "{% block title %}Home{% endblock %}")],
/// )
/// .unwrap();
///
/// let html = cache.render_to_string("home.html", &serde_json::json!({})).unwrap();
/// assert_eq!(html, "<title>Home</title>");
/// ```
#[derive(Debug)]
pub struct TemplateCache {
    pages: BTreeMap<String, TemplateUnit>,
}

impl TemplateCache {
    /// Composes every page from the base layout and the shared partials.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] for malformed templates, calls to unknown
    /// filters, two pages or
    /// partials with the same base name, two partials filling the same slot,
    /// or an include of a partial that does not exist.
    pub fn build(
        base: TemplateSource,
        partials: Vec<TemplateSource>,
        pages: Vec<TemplateSource>,
    ) -> Result<Self, BuildError> {
        let base = base.compile()?;

        let mut partial_templates = BTreeMap::new();
        let mut partial_slots: HashMap<String, Vec<Node>> = HashMap::new();
        let mut slot_owners: HashMap<String, String> = HashMap::new();
        for source in &partials {
            let name = source.base_name().to_string();
            if partial_templates.contains_key(&name) {
                return Err(BuildError::DuplicatePartial(name));
            }
            let template = source.compile()?;
            for (block, content) in template.blocks() {
                if let Some(first) = slot_owners.get(block) {
                    return Err(BuildError::DuplicateSlot {
                        block: block.to_string(),
                        first: first.clone(),
                        second: name,
                    });
                }
                slot_owners.insert(block.to_string(), name.clone());
                partial_slots.insert(block.to_string(), content.to_vec());
            }
            partial_templates.insert(name, template);
        }

        let check_includes = |template: &Template| -> Result<(), BuildError> {
            match template
                .includes()
                .into_iter()
                .find(|inc| !partial_templates.contains_key(*inc))
            {
                Some(missing) => Err(BuildError::UnknownPartial {
                    template: template.name.clone(),
                    partial: missing.to_string(),
                }),
                None => Ok(()),
            }
        };
        check_includes(&base)?;
        for template in partial_templates.values() {
            check_includes(template)?;
        }

        let mut compiled_pages = Vec::with_capacity(pages.len());
        for source in &pages {
            let template = source.compile()?;
            check_includes(&template)?;
            compiled_pages.push(template);
        }

        let layout = Arc::new(Layout {
            base,
            partials: partial_templates,
            partial_slots,
        });

        let mut units = BTreeMap::new();
        for template in compiled_pages {
            let name = template.name.clone();
            if units.contains_key(&name) {
                return Err(BuildError::DuplicatePage(name));
            }
            let slots = template
                .blocks()
                .into_iter()
                .map(|(block, content)| (block.to_string(), content.to_vec()))
                .collect();
            units.insert(
                name.clone(),
                TemplateUnit {
                    name,
                    layout: Arc::clone(&layout),
                    slots,
                },
            );
        }

        tracing::info!(
            pages = units.len(),
            partials = layout.partials.len(),
            "template cache built"
        );
        Ok(Self { pages: units })
    }

    /// Loads `dir/base.html`, `dir/partials/*.html` and `dir/pages/*.html`
    /// and composes them with [`build`](Self::build).
    ///
    /// Files are read in name order so the result does not depend on
    /// directory iteration order. Missing `partials` or `pages` directories
    /// count as empty.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingBase`] if `base.html` is absent, and any
    /// IO or composition error.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, BuildError> {
        let dir = dir.as_ref();
        let base_path = dir.join(BASE_LAYOUT);
        if !base_path.is_file() {
            return Err(BuildError::MissingBase(base_path));
        }
        let base = TemplateSource::from_path(&base_path)?;
        let partials = read_html_dir(&dir.join("partials"))?;
        let pages = read_html_dir(&dir.join("pages"))?;
        Self::build(base, partials, pages)
    }

    /// Renders `page` with `data` and, only on success, commits `status`
    /// and writes the body to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotFound`] for an unknown page and
    /// [`RenderError::Execution`] for execution faults. In both cases the
    /// sink is left untouched.
    pub fn render<T, S>(
        &self,
        page: &str,
        data: &T,
        status: StatusCode,
        sink: &mut S,
    ) -> Result<(), RenderError>
    where
        T: Serialize + ?Sized,
        S: ResponseSink + ?Sized,
    {
        let body = self.render_to_string(page, data)?;
        sink.commit_status(status);
        sink.write_body(Bytes::from(body));
        Ok(())
    }

    /// Renders `page` with `data` into a string.
    ///
    /// # Errors
    ///
    /// Same as [`render`](Self::render).
    pub fn render_to_string<T: Serialize + ?Sized>(
        &self,
        page: &str,
        data: &T,
    ) -> Result<String, RenderError> {
        let unit = self
            .pages
            .get(page)
            .ok_or_else(|| RenderError::NotFound(page.to_string()))?;
        let execution = |source| RenderError::Execution {
            page: page.to_string(),
            source,
        };
        let mut context = Context::from_serialize(data).map_err(execution)?;
        unit.execute(&mut context).map_err(execution)
    }

    /// The page names, sorted.
    pub fn page_names(&self) -> Vec<&str> {
        self.pages.keys().map(String::as_str).collect()
    }

    /// Returns `true` if `page` is in the cache.
    pub fn contains(&self, page: &str) -> bool {
        self.pages.contains_key(page)
    }

    /// The composed page, if present.
    pub fn get(&self, page: &str) -> Option<&TemplateUnit> {
        self.pages.get(page)
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if there are no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Reads every `*.html` file directly inside `dir`, sorted by file name.
fn read_html_dir(dir: &Path) -> Result<Vec<TemplateSource>, BuildError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(io_err)?;
    paths.retain(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "html"));
    paths.sort();
    paths.iter().map(|p| TemplateSource::from_path(p)).collect()
}
