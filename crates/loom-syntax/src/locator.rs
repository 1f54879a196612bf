//! Locates function declarations by their binding path.
//!
//! A compiled bundle never carries a symbol table, so a target such as
//! `Car.prototype.update` is resolved by walking the syntax tree and deriving
//! a binding path for every function whose body is a statement block. The
//! path comes from the syntactic position of the function: its declared name,
//! the class or object literal that owns it, or the left-hand side of the
//! assignment that binds it.
//!
//! Instance members of a class carry a `prototype` segment and static members
//! do not, so `Car.prototype.update` and `Car.update` name different
//! functions. Accessors are spelled with a leading `get` or `set`.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::parser::ParseResult;

/// Segment marking an instance member.
const PROTOTYPE_SEGMENT: &str = "prototype";

/// Which half of an accessor pair a path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// `get name() {}`
    Get,
    /// `set name(value) {}`
    Set,
}

impl Accessor {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
        }
    }

    /// Splits a leading `get ` or `set ` off a target spelling.
    fn split_prefix(input: &str) -> (Option<Self>, &str) {
        [Self::Get, Self::Set]
            .into_iter()
            .find_map(|accessor| {
                input
                    .strip_prefix(accessor.keyword())
                    .filter(|rest| rest.starts_with(char::is_whitespace))
                    .map(|rest| (Some(accessor), rest.trim_start()))
            })
            .unwrap_or((None, input))
    }
}

/// Dot-separated path naming a function binding, e.g. `Car.prototype.update`
/// or `get Car.prototype.speed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BindingPath {
    segments: Vec<String>,
    accessor: Option<Accessor>,
}

impl BindingPath {
    /// Builds a path from already-split segments. Empty segments are skipped.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|segment: &String| !segment.is_empty())
                .collect(),
            accessor: None,
        }
    }

    /// Returns the segments, `prototype` included.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Accessor half named by the path, if any.
    #[must_use]
    pub const fn accessor(&self) -> Option<Accessor> {
        self.accessor
    }

    /// Returns `true` when the path names an instance member.
    #[must_use]
    pub fn is_instance_member(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| segment == PROTOTYPE_SEGMENT)
    }

    /// Returns `true` when the path names nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `site` answers this path when no site matches it exactly.
    ///
    /// A path without an accessor accepts either accessor half, and a path
    /// without a `prototype` segment accepts instance members too.
    #[must_use]
    pub fn loosely_matches(&self, site: &Self) -> bool {
        if self.accessor.is_some() && self.accessor != site.accessor {
            return false;
        }
        let keep_prototype = self.is_instance_member();
        let candidate = site
            .segments
            .iter()
            .filter(|segment| keep_prototype || segment.as_str() != PROTOTYPE_SEGMENT);
        self.segments.iter().eq(candidate)
    }

    fn joined(mut self, segment: impl Into<String>) -> Self {
        let text = segment.into();
        if !text.is_empty() {
            self.segments.push(text);
        }
        self
    }

    const fn with_accessor(mut self, accessor: Option<Accessor>) -> Self {
        self.accessor = accessor;
        self
    }
}

impl FromStr for BindingPath {
    type Err = std::convert::Infallible;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (accessor, path) = Accessor::split_prefix(input.trim());
        Ok(Self::from_segments(path.split('.').map(str::trim)).with_accessor(accessor))
    }
}

impl fmt::Display for BindingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(accessor) = self.accessor {
            write!(f, "{} ", accessor.keyword())?;
        }
        f.write_str(&self.segments.join("."))
    }
}

/// Syntactic form of a located function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// `function name() {}` at statement level.
    Declaration,
    /// A method inside a class body or object literal.
    Method,
    /// A `function` expression bound by assignment, declarator, or property.
    Expression,
    /// An arrow function with a block body.
    Arrow,
}

/// A function declaration found in a parsed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSite {
    path: BindingPath,
    kind: FunctionKind,
    byte_range: Range<usize>,
    line: u32,
}

impl FunctionSite {
    /// Binding path derived for the function.
    #[must_use]
    pub const fn path(&self) -> &BindingPath {
        &self.path
    }

    /// Syntactic form of the function.
    #[must_use]
    pub const fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Byte range of the whole function text in the source.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.byte_range.clone()
    }

    /// One-based line the function starts on.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

/// Walks a parse result and reports function sites.
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionLocator;

impl FunctionLocator {
    /// Creates a locator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns every weavable function site in source order.
    #[must_use]
    pub fn sites(&self, parsed: &ParseResult) -> Vec<FunctionSite> {
        let mut sites = Vec::new();
        collect_sites(parsed.root_node(), parsed, &mut sites);
        sites
    }

    /// Returns the sites bound to `target`.
    ///
    /// Sites whose path equals `target` win. Only when there are none does
    /// the lookup fall back to [`BindingPath::loosely_matches`], so `Car.update`
    /// still finds a lone instance method.
    #[must_use]
    pub fn find(&self, parsed: &ParseResult, target: &BindingPath) -> Vec<FunctionSite> {
        if target.is_empty() {
            return Vec::new();
        }
        let sites = self.sites(parsed);
        let exact: Vec<FunctionSite> = sites
            .iter()
            .filter(|site| site.path() == target)
            .cloned()
            .collect();
        if !exact.is_empty() {
            return exact;
        }
        sites
            .into_iter()
            .filter(|site| target.loosely_matches(site.path()))
            .collect()
    }
}

fn collect_sites(node: tree_sitter::Node<'_>, parsed: &ParseResult, sites: &mut Vec<FunctionSite>) {
    if let Some(site) = site_for(node, parsed) {
        sites.push(site);
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_sites(child, parsed, sites);
    }
}

fn site_for(node: tree_sitter::Node<'_>, parsed: &ParseResult) -> Option<FunctionSite> {
    let kind = function_kind(node.kind())?;
    let body = node.child_by_field_name("body")?;
    if body.kind() != "statement_block" {
        return None;
    }

    let path = match kind {
        FunctionKind::Declaration => {
            BindingPath::default().joined(parsed.text_of(node.child_by_field_name("name")?))
        }
        FunctionKind::Method => {
            let owner = owner_path(node.parent()?, parsed)?;
            owner
                .member(node, member_name(node.child_by_field_name("name")?, parsed))
                .with_accessor(accessor_of(node))
        }
        FunctionKind::Expression | FunctionKind::Arrow => bound_path(node, parsed)?,
    };
    if path.is_empty() {
        return None;
    }

    let line = u32::try_from(node.start_position().row.saturating_add(1)).unwrap_or(u32::MAX);
    Some(FunctionSite {
        path,
        kind,
        byte_range: node.byte_range(),
        line,
    })
}

fn function_kind(kind: &str) -> Option<FunctionKind> {
    match kind {
        "function_declaration" | "generator_function_declaration" => {
            Some(FunctionKind::Declaration)
        }
        "method_definition" => Some(FunctionKind::Method),
        "function_expression" | "function" | "generator_function" => {
            Some(FunctionKind::Expression)
        }
        "arrow_function" => Some(FunctionKind::Arrow),
        _ => None,
    }
}

/// A class or object literal that members hang off.
struct Owner {
    path: BindingPath,
    class: bool,
}

impl Owner {
    /// Path of the member declared by `declaration` under `name`.
    fn member(self, declaration: tree_sitter::Node<'_>, name: &str) -> BindingPath {
        let base = if self.class && !is_static(declaration) {
            self.path.joined(PROTOTYPE_SEGMENT)
        } else {
            self.path
        };
        base.joined(name)
    }
}

/// Keyword tokens written before a member's name, such as `static` or `get`.
fn modifiers(declaration: tree_sitter::Node<'_>) -> Vec<&'static str> {
    let mut cursor = declaration.walk();
    declaration
        .children(&mut cursor)
        .filter(|child| !child.is_named())
        .map(|child| child.kind())
        .collect()
}

fn is_static(declaration: tree_sitter::Node<'_>) -> bool {
    modifiers(declaration)
        .into_iter()
        .any(|kind| matches!(kind, "static" | "static get"))
}

fn accessor_of(method: tree_sitter::Node<'_>) -> Option<Accessor> {
    modifiers(method).into_iter().find_map(|kind| match kind {
        "get" | "static get" => Some(Accessor::Get),
        "set" => Some(Accessor::Set),
        _ => None,
    })
}

/// The class body or object literal that owns a member.
fn owner_path(container: tree_sitter::Node<'_>, parsed: &ParseResult) -> Option<Owner> {
    match container.kind() {
        "class_body" => {
            let class = container.parent()?;
            let path = class.child_by_field_name("name").map_or_else(
                || bound_path(class, parsed),
                |name| Some(BindingPath::default().joined(parsed.text_of(name))),
            )?;
            Some(Owner { path, class: true })
        }
        "object" => Some(Owner {
            path: bound_path(container, parsed)?,
            class: false,
        }),
        _ => None,
    }
}

/// Path a value is bound to through a declarator, assignment, or property.
fn bound_path(value: tree_sitter::Node<'_>, parsed: &ParseResult) -> Option<BindingPath> {
    let parent = value.parent()?;
    match parent.kind() {
        "variable_declarator" => {
            if parent.child_by_field_name("value")? != value {
                return None;
            }
            let name = parent.child_by_field_name("name")?;
            (name.kind() == "identifier")
                .then(|| BindingPath::default().joined(parsed.text_of(name)))
        }
        "assignment_expression" => {
            if parent.child_by_field_name("right")? != value {
                return None;
            }
            expression_path(parent.child_by_field_name("left")?, parsed)
        }
        "pair" => {
            if parent.child_by_field_name("value")? != value {
                return None;
            }
            let owner = owner_path(parent.parent()?, parsed)?;
            Some(owner.member(parent, member_name(parent.child_by_field_name("key")?, parsed)))
        }
        "public_field_definition" | "field_definition" => {
            let name = parent
                .child_by_field_name("name")
                .or_else(|| parent.child_by_field_name("property"))?;
            let owner = owner_path(parent.parent()?, parsed)?;
            Some(owner.member(parent, member_name(name, parsed)))
        }
        "parenthesized_expression" => bound_path(parent, parsed),
        _ => None,
    }
}

/// Path of an assignment target such as `a.b.c`.
fn expression_path(node: tree_sitter::Node<'_>, parsed: &ParseResult) -> Option<BindingPath> {
    match node.kind() {
        "identifier" => Some(BindingPath::default().joined(parsed.text_of(node))),
        "member_expression" => {
            let object = expression_path(node.child_by_field_name("object")?, parsed)?;
            let property = node.child_by_field_name("property")?;
            Some(object.joined(parsed.text_of(property)))
        }
        _ => None,
    }
}

/// Member names may be quoted (`"tick"() {}`); quotes are not part of the path.
fn member_name<'a>(node: tree_sitter::Node<'_>, parsed: &'a ParseResult) -> &'a str {
    parsed
        .text_of(node)
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
}
