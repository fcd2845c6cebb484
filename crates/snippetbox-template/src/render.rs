//! Node execution and the response sink abstraction.
//!
//! Rendering is two-phase: a page is executed into an in-memory buffer, and
//! only when that succeeds is anything handed to a [`ResponseSink`]. A failed
//! render therefore never leaves a half-written response behind.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::StatusCode;

use crate::context::{escape_html, Context, ContextValue};
use crate::error::TemplateError;
use crate::parser::Node;

/// How deeply blocks and includes may nest before rendering gives up.
pub const MAX_DEPTH: usize = 32;

/// Where a rendered page goes.
///
/// [`TemplateCache::render`](crate::TemplateCache::render) calls
/// `commit_status` exactly once and then `write_body` exactly once, and
/// only after the page rendered successfully.
pub trait ResponseSink {
    /// Fixes the response status.
    fn commit_status(&mut self, status: StatusCode);

    /// Writes the complete response body.
    fn write_body(&mut self, body: Bytes);
}

/// A [`ResponseSink`] that keeps everything in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferedSink {
    /// The committed status, if any.
    pub status: Option<StatusCode>,
    /// Every body chunk written, in order.
    pub chunks: Vec<Bytes>,
}

impl BufferedSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing has been committed or written.
    pub fn is_untouched(&self) -> bool {
        self.status.is_none() && self.chunks.is_empty()
    }

    /// The concatenated body as UTF-8 (lossy).
    pub fn body_string(&self) -> String {
        let bytes: Vec<u8> = self.chunks.iter().flat_map(|c| c.iter().copied()).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl ResponseSink for BufferedSink {
    fn commit_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn write_body(&mut self, body: Bytes) {
        self.chunks.push(body);
    }
}

/// Resolves the names a node tree refers to but does not contain.
pub(crate) trait Composition {
    /// The content filling a `{% block %}` slot, if anything fills it.
    fn slot(&self, name: &str) -> Option<&[Node]>;

    /// The body of an includable partial.
    fn partial(&self, name: &str) -> Option<&[Node]>;
}

/// Executes `nodes` into `out`.
pub(crate) fn render_nodes(
    nodes: &[Node],
    context: &mut Context,
    composition: &dyn Composition,
    depth: usize,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        render_node(node, context, composition, depth, out)?;
    }
    Ok(())
}

fn render_node(
    node: &Node,
    context: &mut Context,
    composition: &dyn Composition,
    depth: usize,
    out: &mut String,
) -> Result<(), TemplateError> {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Variable(expr) => {
            let value = expr.resolve(context)?;
            if context.auto_escape() && !value.is_safe() {
                out.push_str(&escape_html(&value.to_display_string()));
            } else {
                out.push_str(&value.to_display_string());
            }
        }
        Node::Block { name, content } => {
            let nodes = composition.slot(name).unwrap_or(content);
            render_nested(nodes, context, composition, depth, out)?;
        }
        Node::Include { name } => {
            let nodes = composition
                .partial(name)
                .ok_or_else(|| TemplateError::syntax(format!("Unknown partial '{name}'")))?;
            render_nested(nodes, context, composition, depth, out)?;
        }
        Node::If { branches } => {
            for (condition, body) in branches {
                if condition.evaluate(context)? {
                    render_nodes(body, context, composition, depth, out)?;
                    break;
                }
            }
        }
        Node::For {
            loop_vars,
            iterable,
            reversed,
            body,
            empty_body,
        } => {
            let items = loop_items(iterable.resolve(context)?, loop_vars.len())?;
            if items.is_empty() {
                render_nodes(empty_body, context, composition, depth, out)?;
            } else {
                let ordered: Box<dyn Iterator<Item = &ContextValue>> = if *reversed {
                    Box::new(items.iter().rev())
                } else {
                    Box::new(items.iter())
                };
                let parent_loop = context.get("forloop").ok().flatten().cloned();
                let total = items.len();
                for (idx, item) in ordered.enumerate() {
                    context.push();
                    bind_loop_vars(context, loop_vars, item)?;
                    context.set("forloop", forloop(idx, total, parent_loop.as_ref()));
                    let result = render_nodes(body, context, composition, depth, out);
                    context.pop();
                    result?;
                }
            }
        }
        Node::With { assignments, body } => {
            let values = assignments
                .iter()
                .map(|(key, expr)| Ok::<_, TemplateError>((key.clone(), expr.resolve(context)?)))
                .collect::<Result<Vec<_>, TemplateError>>()?;
            context.push();
            for (key, value) in values {
                context.set(key, value);
            }
            let result = render_nodes(body, context, composition, depth, out);
            context.pop();
            result?;
        }
        Node::Autoescape { enabled, body } => {
            let prev = context.auto_escape();
            context.set_auto_escape(*enabled);
            let result = render_nodes(body, context, composition, depth, out);
            context.set_auto_escape(prev);
            result?;
        }
    }
    Ok(())
}

fn render_nested(
    nodes: &[Node],
    context: &mut Context,
    composition: &dyn Composition,
    depth: usize,
    out: &mut String,
) -> Result<(), TemplateError> {
    if depth >= MAX_DEPTH {
        return Err(TemplateError::RecursionLimit(MAX_DEPTH));
    }
    render_nodes(nodes, context, composition, depth + 1, out)
}

/// Turns a loop's iterable into the items it visits.
///
/// A dict visits its keys, or `[key, value]` pairs when the loop unpacks
/// two or more variables. `None` visits nothing.
fn loop_items(value: ContextValue, var_count: usize) -> Result<Vec<ContextValue>, TemplateError> {
    match value {
        ContextValue::List(items) => Ok(items),
        ContextValue::Dict(map) if var_count >= 2 => Ok(map
            .into_iter()
            .map(|(k, v)| ContextValue::List(vec![ContextValue::String(k), v]))
            .collect()),
        ContextValue::Dict(map) => Ok(map.into_keys().map(ContextValue::String).collect()),
        ContextValue::None => Ok(Vec::new()),
        other => Err(TemplateError::NotIterable(other.to_display_string())),
    }
}

fn bind_loop_vars(
    context: &mut Context,
    loop_vars: &[String],
    item: &ContextValue,
) -> Result<(), TemplateError> {
    match (loop_vars, item) {
        ([single], _) => context.set(single, item.clone()),
        (vars, ContextValue::List(parts)) => {
            for (i, var) in vars.iter().enumerate() {
                context.set(var, parts.get(i).cloned().unwrap_or(ContextValue::None));
            }
        }
        _ => return Err(TemplateError::NotIterable(item.to_display_string())),
    }
    Ok(())
}

#[allow(clippy::cast_possible_wrap)]
fn forloop(idx: usize, total: usize, parent: Option<&ContextValue>) -> ContextValue {
    let mut map = BTreeMap::new();
    map.insert("counter".to_string(), ContextValue::Integer((idx + 1) as i64));
    map.insert("counter0".to_string(), ContextValue::Integer(idx as i64));
    map.insert(
        "revcounter".to_string(),
        ContextValue::Integer((total - idx) as i64),
    );
    map.insert(
        "revcounter0".to_string(),
        ContextValue::Integer((total - idx - 1) as i64),
    );
    map.insert("first".to_string(), ContextValue::Bool(idx == 0));
    map.insert("last".to_string(), ContextValue::Bool(idx + 1 == total));
    if let Some(parent) = parent {
        map.insert("parentloop".to_string(), parent.clone());
    }
    ContextValue::Dict(map)
}
