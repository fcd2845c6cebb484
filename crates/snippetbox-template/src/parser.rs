//! Template parser.
//!
//! Converts a stream of lexer [`Token`]s into a tree of [`Node`]s. Handles
//! expression parsing, filter chains, `{% if %}` conditions and the block
//! tags the composer understands.

use std::collections::HashSet;

use crate::context::{Context, ContextValue};
use crate::error::TemplateError;
use crate::filters::default_registry;
use crate::lexer::{self, Token};

/// A parsed filter call with a name and optional argument.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    /// The filter name (e.g., `lower`, `truncatechars`).
    pub name: String,
    /// Arguments to the filter (e.g., the `30` in `truncatechars:30`).
    pub args: Vec<Expression>,
}

/// A variable name or a literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A variable reference, possibly dot-separated (e.g., `snippet.title`).
    Variable(String),
    /// A string literal (e.g., `"hello"` or `'hello'`).
    StringLiteral(String),
    /// An integer literal.
    IntegerLiteral(i64),
    /// A floating point literal.
    FloatLiteral(f64),
    /// `true` / `false`.
    BoolLiteral(bool),
    /// `none`.
    NoneLiteral,
}

impl Expression {
    /// Resolves this expression against a context.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownVariable`] if a variable's first path
    /// segment is not defined.
    pub fn resolve(&self, context: &Context) -> Result<ContextValue, TemplateError> {
        Ok(match self {
            Self::Variable(name) => context.get(name)?.cloned().unwrap_or(ContextValue::None),
            Self::StringLiteral(s) => ContextValue::String(s.clone()),
            Self::IntegerLiteral(i) => ContextValue::Integer(*i),
            Self::FloatLiteral(f) => ContextValue::Float(*f),
            Self::BoolLiteral(b) => ContextValue::Bool(*b),
            Self::NoneLiteral => ContextValue::None,
        })
    }
}

/// An expression followed by a filter chain: `snippet.created|human_date`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    /// The base expression.
    pub expression: Expression,
    /// Filter calls to apply in order.
    pub filters: Vec<FilterCall>,
}

impl FilterExpression {
    /// Resolves the base expression and applies every filter in turn.
    ///
    /// # Errors
    ///
    /// Propagates lookup failures and filter errors.
    pub fn resolve(&self, context: &Context) -> Result<ContextValue, TemplateError> {
        let registry = default_registry();
        let mut value = self.expression.resolve(context)?;
        for filter in &self.filters {
            let args = filter
                .args
                .iter()
                .map(|a| a.resolve(context))
                .collect::<Result<Vec<_>, _>>()?;
            value = registry.apply(&filter.name, &value, &args)?;
        }
        Ok(value)
    }
}

/// A node in the parsed template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A literal text segment.
    Text(String),
    /// `{{ expression|filters }}`.
    Variable(FilterExpression),
    /// `{% block name %}default{% endblock %}`: a named slot.
    Block {
        /// The slot name.
        name: String,
        /// Content used when nothing fills the slot.
        content: Vec<Node>,
    },
    /// `{% if %}` with its `elif`/`else` branches.
    If {
        /// Conditions and their bodies, tried in order.
        branches: Vec<(IfCondition, Vec<Node>)>,
    },
    /// `{% for x in xs %}...{% empty %}...{% endfor %}`.
    For {
        /// The loop variable name(s).
        loop_vars: Vec<String>,
        /// The iterable expression.
        iterable: FilterExpression,
        /// Iterate from the end.
        reversed: bool,
        /// Body nodes.
        body: Vec<Node>,
        /// Rendered when the iterable is empty.
        empty_body: Vec<Node>,
    },
    /// `{% with a=b %}...{% endwith %}`.
    With {
        /// Variable assignments.
        assignments: Vec<(String, FilterExpression)>,
        /// Body nodes.
        body: Vec<Node>,
    },
    /// `{% include "nav.html" %}`.
    Include {
        /// The partial's base file name.
        name: String,
    },
    /// `{% autoescape on|off %}...{% endautoescape %}`.
    Autoescape {
        /// Whether escaping is on inside the body.
        enabled: bool,
        /// Body nodes.
        body: Vec<Node>,
    },
}

/// A condition in an `{% if %}` branch.
#[derive(Debug, Clone, PartialEq)]
pub enum IfCondition {
    /// A simple expression truthiness test.
    Expr(FilterExpression),
    /// Negation of a condition.
    Not(Box<IfCondition>),
    /// Logical AND of two conditions.
    And(Box<IfCondition>, Box<IfCondition>),
    /// Logical OR of two conditions.
    Or(Box<IfCondition>, Box<IfCondition>),
    /// Comparison: `==`, `!=`, `<`, `>`, `<=`, `>=`.
    Compare(FilterExpression, CompareOp, FilterExpression),
    /// `in` operator.
    In(FilterExpression, FilterExpression),
    /// `not in` operator.
    NotIn(FilterExpression, FilterExpression),
    /// The `else` clause (always true).
    Else,
}

/// A comparison operator in an `{% if %}` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            _ => return None,
        })
    }
}

impl IfCondition {
    /// Evaluates this condition against a context.
    ///
    /// # Errors
    ///
    /// Propagates lookup and filter failures from the operands.
    pub fn evaluate(&self, context: &Context) -> Result<bool, TemplateError> {
        Ok(match self {
            Self::Expr(expr) => expr.resolve(context)?.is_truthy(),
            Self::Not(inner) => !inner.evaluate(context)?,
            Self::And(left, right) => left.evaluate(context)? && right.evaluate(context)?,
            Self::Or(left, right) => left.evaluate(context)? || right.evaluate(context)?,
            Self::Compare(left, op, right) => {
                compare_values(&left.resolve(context)?, *op, &right.resolve(context)?)
            }
            Self::In(needle, haystack) => {
                value_in(&needle.resolve(context)?, &haystack.resolve(context)?)
            }
            Self::NotIn(needle, haystack) => {
                !value_in(&needle.resolve(context)?, &haystack.resolve(context)?)
            }
            Self::Else => true,
        })
    }
}

fn value_in(needle: &ContextValue, haystack: &ContextValue) -> bool {
    match haystack {
        ContextValue::List(items) => items.iter().any(|item| item == needle),
        ContextValue::String(s) | ContextValue::SafeString(s) => {
            needle.as_str().is_some_and(|n| s.contains(n))
        }
        ContextValue::Dict(map) => needle.as_str().is_some_and(|k| map.contains_key(k)),
        _ => false,
    }
}

fn compare_values(left: &ContextValue, op: CompareOp, right: &ContextValue) -> bool {
    use std::cmp::Ordering;

    let ordering = match (left.as_float(), right.as_float()) {
        (Some(l), Some(r)) => l.partial_cmp(&r),
        _ => match (left.as_str(), right.as_str()) {
            (Some(l), Some(r)) => Some(l.cmp(r)),
            _ => None,
        },
    };

    match op {
        CompareOp::Eq => left == right,
        CompareOp::Ne => left != right,
        CompareOp::Lt => ordering == Some(Ordering::Less),
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    }
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// The template name.
    pub name: String,
    /// The parsed node tree.
    pub nodes: Vec<Node>,
}

impl Template {
    /// Tokenizes and parses a template source.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] for malformed source.
    pub fn compile(name: &str, source: &str) -> Result<Self, TemplateError> {
        let tokens = lexer::tokenize(source)?;
        parse(name, &tokens)
    }

    /// Every `{% block %}` in the tree, outermost first, with its content.
    pub fn blocks(&self) -> Vec<(&str, &[Node])> {
        let mut out = Vec::new();
        collect_blocks(&self.nodes, &mut out);
        out
    }

    /// The names of every partial this template includes.
    pub fn includes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_includes(&self.nodes, &mut out);
        out
    }

    /// The name of every filter called anywhere in the tree, in source order.
    pub fn filter_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_filters(&self.nodes, &mut out);
        out
    }
}

fn children(node: &Node) -> Vec<&[Node]> {
    match node {
        Node::Block { content, .. } => vec![content.as_slice()],
        Node::If { branches } => branches.iter().map(|(_, b)| b.as_slice()).collect(),
        Node::For {
            body, empty_body, ..
        } => vec![body.as_slice(), empty_body.as_slice()],
        Node::With { body, .. } | Node::Autoescape { body, .. } => vec![body.as_slice()],
        Node::Text(_) | Node::Variable(_) | Node::Include { .. } => Vec::new(),
    }
}

fn collect_blocks<'a>(nodes: &'a [Node], out: &mut Vec<(&'a str, &'a [Node])>) {
    for node in nodes {
        if let Node::Block { name, content } = node {
            out.push((name.as_str(), content.as_slice()));
        }
        for child in children(node) {
            collect_blocks(child, out);
        }
    }
}

fn collect_includes<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        if let Node::Include { name } = node {
            out.push(name.as_str());
        }
        for child in children(node) {
            collect_includes(child, out);
        }
    }
}

fn collect_filters<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Variable(expr) | Node::For { iterable: expr, .. } => push_filters(expr, out),
            Node::With { assignments, .. } => {
                for (_, expr) in assignments {
                    push_filters(expr, out);
                }
            }
            Node::If { branches } => {
                for (condition, _) in branches {
                    condition_filters(condition, out);
                }
            }
            Node::Text(_) | Node::Block { .. } | Node::Include { .. } | Node::Autoescape { .. } => {}
        }
        for child in children(node) {
            collect_filters(child, out);
        }
    }
}

fn condition_filters<'a>(condition: &'a IfCondition, out: &mut Vec<&'a str>) {
    match condition {
        IfCondition::Expr(expr) => push_filters(expr, out),
        IfCondition::Not(inner) => condition_filters(inner, out),
        IfCondition::And(a, b) | IfCondition::Or(a, b) => {
            condition_filters(a, out);
            condition_filters(b, out);
        }
        IfCondition::Compare(a, _, b) | IfCondition::In(a, b) | IfCondition::NotIn(a, b) => {
            push_filters(a, out);
            push_filters(b, out);
        }
        IfCondition::Else => {}
    }
}

fn push_filters<'a>(expr: &'a FilterExpression, out: &mut Vec<&'a str>) {
    out.extend(expr.filters.iter().map(|f| f.name.as_str()));
}

/// Parses a list of tokens into a [`Template`].
///
/// # Errors
///
/// Returns [`TemplateError::Syntax`] for unknown tags, unclosed or stray
/// end tags, duplicate block names and malformed expressions.
pub fn parse(name: &str, tokens: &[Token]) -> Result<Template, TemplateError> {
    let mut parser = ParserState::new(tokens);
    let nodes = parser.parse_nodes(&[])?;
    Ok(Template {
        name: name.to_string(),
        nodes,
    })
}

struct ParserState<'a> {
    tokens: &'a [Token],
    pos: usize,
    block_names: HashSet<String>,
}

impl<'a> ParserState<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            block_names: HashSet::new(),
        }
    }

    /// Parses nodes until one of `end_tags` (left unconsumed) or the end of
    /// input. Reaching the end while `end_tags` is non-empty is an error.
    fn parse_nodes(&mut self, end_tags: &[&str]) -> Result<Vec<Node>, TemplateError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.get(self.pos) {
            match token {
                Token::Text(text) => {
                    nodes.push(Node::Text(text.clone()));
                    self.pos += 1;
                }
                Token::Comment(_) => {
                    self.pos += 1;
                }
                Token::Variable(expr) => {
                    nodes.push(Node::Variable(parse_filter_expression(expr)?));
                    self.pos += 1;
                }
                Token::Block(tag_name, args) => {
                    if end_tags.contains(&tag_name.as_str()) {
                        return Ok(nodes);
                    }
                    nodes.push(self.parse_block_tag(tag_name, args)?);
                }
            }
        }

        if end_tags.is_empty() {
            Ok(nodes)
        } else {
            Err(TemplateError::syntax(format!(
                "Unclosed tag: expected one of {}",
                end_tags
                    .iter()
                    .map(|t| format!("'{{% {t} %}}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    /// Returns the tag at the current position and advances past it.
    fn take_tag(&mut self) -> Option<(&'a str, &'a [String])> {
        match self.tokens.get(self.pos) {
            Some(Token::Block(tag, args)) => {
                self.pos += 1;
                Some((tag.as_str(), args.as_slice()))
            }
            _ => None,
        }
    }

    fn parse_block_tag(&mut self, tag_name: &str, args: &[String]) -> Result<Node, TemplateError> {
        match tag_name {
            "block" => self.parse_block(args),
            "if" => self.parse_if(args),
            "for" => self.parse_for(args),
            "with" => self.parse_with(args),
            "include" => {
                let [arg] = args else {
                    return Err(TemplateError::syntax(
                        "{% include %} takes exactly one quoted partial name",
                    ));
                };
                let name = unquote(arg).ok_or_else(|| {
                    TemplateError::syntax(format!(
                        "{{% include %}} requires a quoted name, got {arg}"
                    ))
                })?;
                self.pos += 1;
                Ok(Node::Include {
                    name: name.to_string(),
                })
            }
            "comment" => {
                self.pos += 1;
                self.parse_nodes(&["endcomment"])?;
                self.pos += 1;
                Ok(Node::Text(String::new()))
            }
            "autoescape" => {
                let enabled = match args {
                    [arg] if arg == "on" => true,
                    [arg] if arg == "off" => false,
                    _ => {
                        return Err(TemplateError::syntax(
                            "{% autoescape %} takes 'on' or 'off'",
                        ))
                    }
                };
                self.pos += 1;
                let body = self.parse_nodes(&["endautoescape"])?;
                self.pos += 1;
                Ok(Node::Autoescape { enabled, body })
            }
            _ => Err(TemplateError::syntax(format!("Unexpected tag '{tag_name}'"))),
        }
    }

    fn parse_block(&mut self, args: &[String]) -> Result<Node, TemplateError> {
        let [name] = args else {
            return Err(TemplateError::syntax("{% block %} takes exactly one name"));
        };
        if !is_identifier(name) {
            return Err(TemplateError::syntax(format!("Invalid block name '{name}'")));
        }
        if !self.block_names.insert(name.clone()) {
            return Err(TemplateError::syntax(format!(
                "Block '{name}' appears more than once"
            )));
        }
        self.pos += 1;
        let content = self.parse_nodes(&["endblock"])?;
        if let Some((_, end_args)) = self.take_tag() {
            if let Some(end_name) = end_args.first() {
                if end_name != name {
                    return Err(TemplateError::syntax(format!(
                        "Mismatched '{{% endblock {end_name} %}}' for block '{name}'"
                    )));
                }
            }
        }
        Ok(Node::Block {
            name: name.clone(),
            content,
        })
    }

    fn parse_if(&mut self, args: &[String]) -> Result<Node, TemplateError> {
        let mut branches = Vec::new();
        let mut condition = parse_if_condition(args)?;
        self.pos += 1;

        loop {
            let body = self.parse_nodes(&["elif", "else", "endif"])?;
            branches.push((condition, body));

            match self.take_tag() {
                Some(("elif", tag_args)) => {
                    condition = parse_if_condition(tag_args)?;
                }
                Some(("else", _)) => {
                    let body = self.parse_nodes(&["endif"])?;
                    self.pos += 1;
                    branches.push((IfCondition::Else, body));
                    break;
                }
                _ => break,
            }
        }

        Ok(Node::If { branches })
    }

    fn parse_for(&mut self, args: &[String]) -> Result<Node, TemplateError> {
        let in_pos = args
            .iter()
            .position(|a| a == "in")
            .ok_or_else(|| TemplateError::syntax("{% for %} requires the 'in' keyword"))?;

        let loop_vars: Vec<String> = args[..in_pos]
            .iter()
            .flat_map(|v| v.split(','))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if loop_vars.is_empty() || !loop_vars.iter().all(|v| is_identifier(v)) {
            return Err(TemplateError::syntax("{% for %} needs loop variable names"));
        }

        let mut rest = &args[in_pos + 1..];
        let reversed = rest.last().is_some_and(|a| a == "reversed");
        if reversed {
            rest = &rest[..rest.len() - 1];
        }
        let [iterable] = rest else {
            return Err(TemplateError::syntax("{% for %} needs exactly one iterable"));
        };
        let iterable = parse_filter_expression(iterable)?;

        self.pos += 1;
        let body = self.parse_nodes(&["empty", "endfor"])?;
        let empty_body = match self.take_tag() {
            Some(("empty", _)) => {
                let empty = self.parse_nodes(&["endfor"])?;
                self.pos += 1;
                empty
            }
            _ => Vec::new(),
        };

        Ok(Node::For {
            loop_vars,
            iterable,
            reversed,
            body,
            empty_body,
        })
    }

    fn parse_with(&mut self, args: &[String]) -> Result<Node, TemplateError> {
        if args.is_empty() {
            return Err(TemplateError::syntax("{% with %} requires assignments"));
        }
        let assignments = args
            .iter()
            .map(|arg| {
                let (key, value) = arg.split_once('=').ok_or_else(|| {
                    TemplateError::syntax(format!("{{% with %}} expects name=value, got {arg}"))
                })?;
                if !is_identifier(key) {
                    return Err(TemplateError::syntax(format!("Invalid name '{key}'")));
                }
                Ok((key.to_string(), parse_filter_expression(value)?))
            })
            .collect::<Result<Vec<_>, TemplateError>>()?;

        self.pos += 1;
        let body = self.parse_nodes(&["endwith"])?;
        self.pos += 1;
        Ok(Node::With { assignments, body })
    }
}

/// Parses the content of `{{ }}` or an operand: `name|lower|truncatechars:30`.
///
/// # Errors
///
/// Returns [`TemplateError::Syntax`] for empty parts or invalid names.
pub fn parse_filter_expression(expr: &str) -> Result<FilterExpression, TemplateError> {
    let mut parts = split_outside_quotes(expr, '|').into_iter();
    let base = parts.next().unwrap_or_default();
    let expression = parse_expression(base)?;
    let filters = parts.map(parse_filter_call).collect::<Result<Vec<_>, _>>()?;
    Ok(FilterExpression {
        expression,
        filters,
    })
}

/// Parses a single expression (variable reference or literal).
///
/// # Errors
///
/// Returns [`TemplateError::Syntax`] if the text is empty or not a valid
/// variable path.
pub fn parse_expression(s: &str) -> Result<Expression, TemplateError> {
    let s = s.trim();

    if s.is_empty() {
        return Err(TemplateError::syntax("Empty expression"));
    }
    if let Some(inner) = unquote(s) {
        return Ok(Expression::StringLiteral(inner.to_string()));
    }
    match s {
        "true" | "True" => return Ok(Expression::BoolLiteral(true)),
        "false" | "False" => return Ok(Expression::BoolLiteral(false)),
        "none" | "None" => return Ok(Expression::NoneLiteral),
        _ => {}
    }
    if s.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+' || c == '.') {
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Expression::IntegerLiteral(i));
        }
        if let Ok(f) = s.parse::<f64>() {
            return Ok(Expression::FloatLiteral(f));
        }
        return Err(TemplateError::syntax(format!("Invalid number '{s}'")));
    }
    if s.split('.').all(|seg| !seg.is_empty() && seg.chars().all(is_ident_char)) {
        return Ok(Expression::Variable(s.to_string()));
    }
    Err(TemplateError::syntax(format!("Invalid expression '{s}'")))
}

/// Parses a filter call like `truncatechars:30` or `default:"N/A"`.
fn parse_filter_call(s: &str) -> Result<FilterCall, TemplateError> {
    let s = s.trim();
    let (name, args) = match split_outside_quotes(s, ':').as_slice() {
        [name] => (*name, Vec::new()),
        [name, arg] => (*name, vec![parse_expression(arg)?]),
        _ => {
            return Err(TemplateError::syntax(format!(
                "Filter '{s}' takes at most one argument"
            )))
        }
    };
    let name = name.trim();
    if !is_identifier(name) {
        return Err(TemplateError::syntax(format!("Invalid filter name '{name}'")));
    }
    Ok(FilterCall {
        name: name.to_string(),
        args,
    })
}

/// Splits on `sep` except inside single or double quotes.
fn split_outside_quotes(s: &str, sep: char) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut in_single = false;
    let mut in_double = false;

    for (i, ch) in s.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            c if c == sep && !in_single && !in_double => {
                result.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    result.push(&s[start..]);
    result
}

/// Parses an if-condition from block tag arguments.
fn parse_if_condition(args: &[String]) -> Result<IfCondition, TemplateError> {
    if args.is_empty() {
        return Err(TemplateError::syntax("{% if %} requires a condition"));
    }
    let mut pos = 0;
    let condition = parse_or_condition(args, &mut pos)?;
    if pos < args.len() {
        return Err(TemplateError::syntax(format!(
            "Unexpected '{}' in if-condition",
            args[pos]
        )));
    }
    Ok(condition)
}

fn parse_or_condition(args: &[String], pos: &mut usize) -> Result<IfCondition, TemplateError> {
    let left = parse_and_condition(args, pos)?;
    if args.get(*pos).is_some_and(|a| a == "or") {
        *pos += 1;
        let right = parse_or_condition(args, pos)?;
        Ok(IfCondition::Or(Box::new(left), Box::new(right)))
    } else {
        Ok(left)
    }
}

fn parse_and_condition(args: &[String], pos: &mut usize) -> Result<IfCondition, TemplateError> {
    let left = parse_not_condition(args, pos)?;
    if args.get(*pos).is_some_and(|a| a == "and") {
        *pos += 1;
        let right = parse_and_condition(args, pos)?;
        Ok(IfCondition::And(Box::new(left), Box::new(right)))
    } else {
        Ok(left)
    }
}

fn parse_not_condition(args: &[String], pos: &mut usize) -> Result<IfCondition, TemplateError> {
    if args.get(*pos).is_some_and(|a| a == "not") {
        *pos += 1;
        let inner = parse_not_condition(args, pos)?;
        Ok(IfCondition::Not(Box::new(inner)))
    } else {
        parse_comparison(args, pos)
    }
}

fn parse_comparison(args: &[String], pos: &mut usize) -> Result<IfCondition, TemplateError> {
    let left = args
        .get(*pos)
        .ok_or_else(|| TemplateError::syntax("Unexpected end of if-condition"))?;
    let left = parse_filter_expression(left)?;
    *pos += 1;

    let operand = |pos: &mut usize, after: &str| {
        let right = args.get(*pos).ok_or_else(|| {
            TemplateError::syntax(format!("Expected a value after '{after}'"))
        })?;
        *pos += 1;
        parse_filter_expression(right)
    };

    let next = args.get(*pos).map(String::as_str);
    if let Some((symbol, op)) = next.and_then(|s| CompareOp::parse(s).map(|op| (s, op))) {
        *pos += 1;
        let right = operand(pos, symbol)?;
        return Ok(IfCondition::Compare(left, op, right));
    }

    match next {
        Some("in") => {
            *pos += 1;
            Ok(IfCondition::In(left, operand(pos, "in")?))
        }
        Some("not") if args.get(*pos + 1).is_some_and(|a| a == "in") => {
            *pos += 2;
            Ok(IfCondition::NotIn(left, operand(pos, "not in")?))
        }
        _ => Ok(IfCondition::Expr(left)),
    }
}

/// Returns the inner text of a `"quoted"` or `'quoted'` string.
fn unquote(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_ident_char)
}
