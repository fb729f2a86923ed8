//! GraphML loader for recorded event graphs.
//!
//! Streams the document with `quick-xml`, resolving `<data>` values through
//! the `<key>` declarations (type and default) and building an
//! [`EventGraph`]. Only directed graphs are accepted, and every edge must
//! carry an integer `id` attribute.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{FlowError, Result};
use crate::graph::store::EventGraph;
use crate::types::{AttrValue, EdgeKey, EventEdge, EventNode};

// ---------------------------------------------------------------------------
// Key declarations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyDomain {
    Node,
    Edge,
    Graph,
    All,
}

impl KeyDomain {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("node") => Self::Node,
            Some("edge") => Self::Edge,
            Some("graph") => Self::Graph,
            _ => Self::All,
        }
    }

    fn covers(self, other: KeyDomain) -> bool {
        self == other || self == Self::All
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrType {
    Bool,
    Int,
    Float,
    String,
}

impl AttrType {
    fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.unwrap_or("string") {
            "boolean" => Ok(Self::Bool),
            "int" | "long" => Ok(Self::Int),
            "float" | "double" => Ok(Self::Float),
            "string" => Ok(Self::String),
            other => Err(FlowError::GraphFormat(format!(
                "unsupported attr.type \"{other}\""
            ))),
        }
    }

    fn convert(self, name: &str, text: &str) -> Result<AttrValue> {
        let bad = || FlowError::GraphFormat(format!("invalid value \"{text}\" for attribute \"{name}\""));
        match self {
            Self::String => Ok(AttrValue::String(text.to_string())),
            Self::Int => text.trim().parse().map(AttrValue::Int).map_err(|_| bad()),
            Self::Float => text.trim().parse().map(AttrValue::Float).map_err(|_| bad()),
            Self::Bool => match text.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(AttrValue::Bool(true)),
                "false" | "0" => Ok(AttrValue::Bool(false)),
                _ => Err(bad()),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct KeyDecl {
    domain: KeyDomain,
    name: String,
    ty: AttrType,
    default: Option<AttrValue>,
}

// ---------------------------------------------------------------------------
// Parser state
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Element {
    Node {
        id: String,
        attrs: BTreeMap<String, AttrValue>,
    },
    Edge {
        source: String,
        target: String,
        key: Option<String>,
        attrs: BTreeMap<String, AttrValue>,
    },
}

#[derive(Debug, Default)]
struct Document {
    keys: HashMap<String, KeyDecl>,
    nodes: Vec<(String, BTreeMap<String, AttrValue>)>,
    edges: Vec<(String, String, Option<String>, BTreeMap<String, AttrValue>)>,
}

impl Document {
    fn finish(&mut self, element: Element) {
        match element {
            Element::Node { id, attrs } => self.nodes.push((id, attrs)),
            Element::Edge {
                source,
                target,
                key,
                attrs,
            } => self.edges.push((source, target, key, attrs)),
        }
    }

    fn apply_defaults(&self, domain: KeyDomain, attrs: &mut BTreeMap<String, AttrValue>) {
        for decl in self.keys.values() {
            if !decl.domain.covers(domain) {
                continue;
            }
            if let Some(default) = &decl.default {
                attrs
                    .entry(decl.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }

    fn into_graph(mut self) -> Result<EventGraph> {
        let mut graph = EventGraph::new();

        let nodes = std::mem::take(&mut self.nodes);
        for (id, mut attrs) in nodes {
            self.apply_defaults(KeyDomain::Node, &mut attrs);
            graph.add_node(EventNode::from_attributes(id, attrs));
        }

        let edges = std::mem::take(&mut self.edges);
        for (source, target, key, mut attrs) in edges {
            self.apply_defaults(KeyDomain::Edge, &mut attrs);
            let key = match key {
                Some(raw) => EdgeKey::parse(&raw),
                None => graph.next_key(&source, &target),
            };
            let edge = EventEdge::from_attributes(key, attrs).ok_or_else(|| {
                FlowError::GraphFormat(format!(
                    "edge ({source}, {target}) has no integer \"id\" attribute"
                ))
            })?;
            graph.add_edge(&source, &target, edge)?;
        }

        Ok(graph)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read and parse a GraphML file.
pub fn read_graphml(path: &Path) -> Result<EventGraph> {
    let text = std::fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;
    let graph = parse_graphml(&text)?;
    tracing::info!(
        "Loaded {} ({} nodes, {} edges)",
        path.display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Parse a GraphML document held in memory.
pub fn parse_graphml(text: &str) -> Result<EventGraph> {
    let mut reader = Reader::from_str(text);
    let mut doc = Document::default();

    let mut current: Option<Element> = None;
    let mut pending_key: Option<(String, KeyDecl)> = None;
    let mut data_key: Option<String> = None;
    let mut in_default = false;
    let mut text_buf = String::new();
    let mut saw_graph = false;
    let mut depth = 0usize;

    loop {
        let event = reader.read_event()?;
        let is_empty = matches!(event, Event::Empty(_));
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        match event {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"key" => {
                    let attrs = xml_attributes(&e)?;
                    let id = required(&attrs, "id", "key")?;
                    let decl = KeyDecl {
                        domain: KeyDomain::parse(attrs.get("for").map(String::as_str)),
                        name: attrs.get("attr.name").cloned().unwrap_or_else(|| id.clone()),
                        ty: AttrType::parse(attrs.get("attr.type").map(String::as_str))?,
                        default: None,
                    };
                    if is_empty {
                        doc.keys.insert(id, decl);
                    } else {
                        pending_key = Some((id, decl));
                    }
                }
                b"default" if !is_empty => {
                    in_default = true;
                    text_buf.clear();
                }
                b"graph" => {
                    saw_graph = true;
                    let attrs = xml_attributes(&e)?;
                    if attrs.get("edgedefault").map(String::as_str) == Some("undirected") {
                        return Err(FlowError::GraphFormat(
                            "expected a directed graph, found edgedefault=\"undirected\"".into(),
                        ));
                    }
                }
                b"node" => {
                    let attrs = xml_attributes(&e)?;
                    let element = Element::Node {
                        id: required(&attrs, "id", "node")?,
                        attrs: BTreeMap::new(),
                    };
                    if is_empty {
                        doc.finish(element);
                    } else {
                        current = Some(element);
                    }
                }
                b"edge" => {
                    let attrs = xml_attributes(&e)?;
                    if attrs.get("directed").map(String::as_str) == Some("false") {
                        return Err(FlowError::GraphFormat(
                            "undirected edges are not supported".into(),
                        ));
                    }
                    let element = Element::Edge {
                        source: required(&attrs, "source", "edge")?,
                        target: required(&attrs, "target", "edge")?,
                        key: attrs.get("id").cloned(),
                        attrs: BTreeMap::new(),
                    };
                    if is_empty {
                        doc.finish(element);
                    } else {
                        current = Some(element);
                    }
                }
                b"data" => {
                    let attrs = xml_attributes(&e)?;
                    let key = required(&attrs, "key", "data")?;
                    if is_empty {
                        store_data(&doc, current.as_mut(), &key, "")?;
                    } else {
                        data_key = Some(key);
                        text_buf.clear();
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if data_key.is_some() || in_default {
                    text_buf.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if data_key.is_some() || in_default {
                    text_buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"data" => {
                    if let Some(key) = data_key.take() {
                        store_data(&doc, current.as_mut(), &key, &text_buf)?;
                    }
                }
                b"default" => {
                    in_default = false;
                    if let Some((_, decl)) = pending_key.as_mut() {
                        decl.default = Some(decl.ty.convert(&decl.name, &text_buf)?);
                    }
                }
                b"key" => {
                    if let Some((id, decl)) = pending_key.take() {
                        doc.keys.insert(id, decl);
                    }
                }
                b"node" | b"edge" => {
                    if let Some(element) = current.take() {
                        doc.finish(element);
                    }
                }
                _ => {}
            },
            Event::Eof => {
                if depth > 0 {
                    return Err(FlowError::GraphFormat(format!(
                        "unexpected end of document with {depth} element(s) still open"
                    )));
                }
                break;
            }
            _ => {}
        }
    }

    if !saw_graph {
        return Err(FlowError::GraphFormat("no <graph> element found".into()));
    }
    doc.into_graph()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn xml_attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        out.insert(name, attr.unescape_value()?.into_owned());
    }
    Ok(out)
}

fn required(attrs: &HashMap<String, String>, name: &str, element: &str) -> Result<String> {
    attrs.get(name).cloned().ok_or_else(|| {
        FlowError::GraphFormat(format!("<{element}> is missing the \"{name}\" attribute"))
    })
}

/// Convert a `<data>` payload through its key declaration and attach it to
/// the enclosing node or edge. Graph-level data is ignored.
fn store_data(doc: &Document, current: Option<&mut Element>, key: &str, text: &str) -> Result<()> {
    let decl = doc
        .keys
        .get(key)
        .ok_or_else(|| FlowError::GraphFormat(format!("<data> refers to undeclared key \"{key}\"")))?;
    let Some(element) = current else {
        return Ok(());
    };
    let value = decl.ty.convert(&decl.name, text)?;
    match element {
        Element::Node { attrs, .. } | Element::Edge { attrs, .. } => {
            attrs.insert(decl.name.clone(), value);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
