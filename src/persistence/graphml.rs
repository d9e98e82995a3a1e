//! GraphML import/export
//!
//! Attribute keys are declared per (domain, name, type), so the same
//! attribute name may appear with different types on different nodes, e.g.
//! `llm_based_prediction` as `long` on scored profiles and as `string` on the
//! rest. String lists are stored in `string` keys marked `attr.list="string"`
//! with a JSON array as the value.
//!
//! On import, a `<default>` inside a node or edge `<key>` fills in that
//! attribute for every element that carries no `<data>` for it.

use super::{write_atomic, PersistenceError, PersistenceResult};
use crate::graph::{Edge, Node, NodeId, PropertyMap, PropertyValue, SocialGraph};
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;
use std::path::Path;
use tracing::info;

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://graphml.graphdrawing.org/xmlns http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Domain {
    Node,
    Edge,
}

impl Domain {
    fn as_str(&self) -> &'static str {
        match self {
            Domain::Node => "node",
            Domain::Edge => "edge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum KeyType {
    String,
    Long,
    Double,
    Boolean,
    StringList,
}

impl KeyType {
    fn of(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::String(_) => KeyType::String,
            PropertyValue::Integer(_) => KeyType::Long,
            PropertyValue::Float(_) => KeyType::Double,
            PropertyValue::Boolean(_) => KeyType::Boolean,
            PropertyValue::StringList(_) => KeyType::StringList,
        }
    }

    fn attr_type(&self) -> &'static str {
        match self {
            KeyType::String | KeyType::StringList => "string",
            KeyType::Long => "long",
            KeyType::Double => "double",
            KeyType::Boolean => "boolean",
        }
    }

    fn parse(attr_type: &str, list: bool) -> PersistenceResult<Self> {
        let kind = match attr_type {
            "string" if list => KeyType::StringList,
            "string" => KeyType::String,
            "long" | "int" | "integer" => KeyType::Long,
            "double" | "float" => KeyType::Double,
            "boolean" => KeyType::Boolean,
            other => return Err(PersistenceError::Format(format!("unsupported attr.type {other:?}"))),
        };
        Ok(kind)
    }

    fn decode(&self, text: &str) -> PersistenceResult<PropertyValue> {
        let bad = |what: &str| PersistenceError::Format(format!("invalid {what} value {text:?}"));
        let value = match self {
            KeyType::String => PropertyValue::String(text.to_string()),
            KeyType::Long => PropertyValue::Integer(text.trim().parse().map_err(|_| bad("long"))?),
            KeyType::Double => PropertyValue::Float(text.trim().parse().map_err(|_| bad("double"))?),
            KeyType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => PropertyValue::Boolean(true),
                "false" | "0" => PropertyValue::Boolean(false),
                _ => return Err(bad("boolean")),
            },
            KeyType::StringList => {
                PropertyValue::StringList(serde_json::from_str(text).map_err(|_| bad("string list"))?)
            }
        };
        Ok(value)
    }
}

fn encode(value: &PropertyValue) -> PersistenceResult<String> {
    let text = match value {
        PropertyValue::String(s) => s.clone(),
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Float(f) => f.to_string(),
        PropertyValue::Boolean(b) => b.to_string(),
        PropertyValue::StringList(list) => {
            serde_json::to_string(list).map_err(|e| PersistenceError::Format(e.to_string()))?
        }
    };
    Ok(text)
}

type KeyTable = IndexMap<(Domain, String, KeyType), String>;

fn collect_keys(graph: &SocialGraph) -> KeyTable {
    let mut keys = KeyTable::new();
    let node_props = graph.nodes().map(|n| (Domain::Node, &n.properties));
    let edge_props = graph.edges().map(|e| (Domain::Edge, &e.properties));
    for (domain, properties) in node_props.chain(edge_props) {
        for (name, value) in properties {
            let next = keys.len();
            keys.entry((domain, name.clone(), KeyType::of(value)))
                .or_insert_with(|| format!("d{next}"));
        }
    }
    keys
}

fn write_data<W: Write>(
    writer: &mut Writer<W>,
    keys: &KeyTable,
    domain: Domain,
    properties: &PropertyMap,
) -> PersistenceResult<()> {
    for (name, value) in properties {
        let Some(id) = keys.get(&(domain, name.clone(), KeyType::of(value))) else {
            continue;
        };
        let text = encode(value)?;
        let mut data = BytesStart::new("data");
        data.push_attribute(("key", id.as_str()));
        // an empty Start/End pair would pick up indentation as content
        if text.is_empty() {
            writer.write_event(Event::Empty(data))?;
        } else {
            writer.write_event(Event::Start(data))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new("data")))?;
        }
    }
    Ok(())
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    keys: &KeyTable,
    domain: Domain,
    start: BytesStart<'_>,
    properties: &PropertyMap,
) -> PersistenceResult<()> {
    if properties.is_empty() {
        writer.write_event(Event::Empty(start))?;
    } else {
        writer.write_event(Event::Start(start))?;
        write_data(writer, keys, domain, properties)?;
        writer.write_event(Event::End(BytesEnd::new(domain.as_str())))?;
    }
    Ok(())
}

/// Serialize `graph` as GraphML into `out`
pub fn write_graphml_to<W: Write>(graph: &SocialGraph, out: W) -> PersistenceResult<()> {
    let keys = collect_keys(graph);
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut root = BytesStart::new("graphml");
    root.push_attribute(("xmlns", GRAPHML_NS));
    root.push_attribute(("xmlns:xsi", XSI_NS));
    root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
    writer.write_event(Event::Start(root))?;

    for ((domain, name, kind), id) in &keys {
        let mut key = BytesStart::new("key");
        key.push_attribute(("id", id.as_str()));
        key.push_attribute(("for", domain.as_str()));
        key.push_attribute(("attr.name", name.as_str()));
        key.push_attribute(("attr.type", kind.attr_type()));
        if *kind == KeyType::StringList {
            key.push_attribute(("attr.list", "string"));
        }
        writer.write_event(Event::Empty(key))?;
    }

    let mut g = BytesStart::new("graph");
    g.push_attribute(("edgedefault", "undirected"));
    writer.write_event(Event::Start(g))?;

    for node in graph.nodes() {
        let id = node.id.as_i64().to_string();
        let mut start = BytesStart::new("node");
        start.push_attribute(("id", id.as_str()));
        write_element(&mut writer, &keys, Domain::Node, start, &node.properties)?;
    }

    for edge in graph.edges() {
        let source = edge.source.as_i64().to_string();
        let target = edge.target.as_i64().to_string();
        let mut start = BytesStart::new("edge");
        start.push_attribute(("source", source.as_str()));
        start.push_attribute(("target", target.as_str()));
        write_element(&mut writer, &keys, Domain::Edge, start, &edge.properties)?;
    }

    writer.write_event(Event::End(BytesEnd::new("graph")))?;
    writer.write_event(Event::End(BytesEnd::new("graphml")))?;
    writer.get_mut().write_all(b"\n").map_err(|e| PersistenceError::Xml(e.into()))?;
    Ok(())
}

/// Serialize `graph` as a GraphML string
pub fn to_graphml_string(graph: &SocialGraph) -> PersistenceResult<String> {
    let mut buf = Vec::new();
    write_graphml_to(graph, &mut buf)?;
    String::from_utf8(buf).map_err(|e| PersistenceError::Format(e.to_string()))
}

/// Write `graph` to a GraphML file, replacing it atomically
pub fn write_graphml(graph: &SocialGraph, path: impl AsRef<Path>) -> PersistenceResult<()> {
    let path = path.as_ref();
    write_atomic(path, |w| write_graphml_to(graph, w))?;
    info!(
        "Wrote GraphML with {} nodes and {} edges to {:?}",
        graph.node_count(),
        graph.edge_count(),
        path
    );
    Ok(())
}

/// Read a GraphML file
pub fn read_graphml(path: impl AsRef<Path>) -> PersistenceResult<SocialGraph> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(PersistenceError::io(path))?;
    let graph = parse_graphml(&xml)?;
    info!(
        "Loaded GraphML with {} nodes and {} edges from {:?}",
        graph.node_count(),
        graph.edge_count(),
        path
    );
    Ok(graph)
}

struct KeyDecl {
    /// `None` for keys declared `for="all"` (or without `for`)
    domain: Option<Domain>,
    name: String,
    kind: KeyType,
    /// Value from `<default>`; graph-level keys never get one
    default: Option<PropertyValue>,
    /// False for `for="graph"` and other non-element keys
    on_elements: bool,
}

enum Element {
    Node(Node),
    Edge(Edge),
}

impl Element {
    fn domain(&self) -> Domain {
        match self {
            Element::Node(_) => Domain::Node,
            Element::Edge(_) => Domain::Edge,
        }
    }

    fn properties_mut(&mut self) -> &mut PropertyMap {
        match self {
            Element::Node(n) => &mut n.properties,
            Element::Edge(e) => &mut e.properties,
        }
    }
}

fn attribute(e: &BytesStart<'_>, name: &str) -> PersistenceResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required(e: &BytesStart<'_>, name: &str) -> PersistenceResult<String> {
    attribute(e, name)?.ok_or_else(|| {
        PersistenceError::Format(format!(
            "<{}> is missing the {name:?} attribute",
            String::from_utf8_lossy(e.local_name().as_ref())
        ))
    })
}

fn node_id(raw: &str) -> PersistenceResult<NodeId> {
    raw.trim()
        .parse::<i64>()
        .map(NodeId)
        .map_err(|_| PersistenceError::Format(format!("node id {raw:?} is not an integer")))
}

/// Incremental GraphML reader state
#[derive(Default)]
struct GraphmlParser {
    graph: SocialGraph,
    keys: IndexMap<String, KeyDecl>,
    current: Option<Element>,
    /// Key id and accumulated text of the open `<data>` element
    data: Option<(String, String)>,
    /// Id of the open `<key>` element
    open_key: Option<String>,
    /// Accumulated text of the open `<default>` element
    default_text: Option<String>,
    saw_root: bool,
}

impl GraphmlParser {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> PersistenceResult<()> {
        match e.local_name().as_ref() {
            b"graphml" => self.saw_root = true,
            b"key" => {
                let id = required(e, "id")?;
                let (domain, on_elements) = match attribute(e, "for")?.as_deref() {
                    Some("node") => (Some(Domain::Node), true),
                    Some("edge") => (Some(Domain::Edge), true),
                    None | Some("all") => (None, true),
                    Some(_) => (None, false),
                };
                let name = attribute(e, "attr.name")?.unwrap_or_else(|| id.clone());
                let attr_type = attribute(e, "attr.type")?.unwrap_or_else(|| "string".to_string());
                let list = attribute(e, "attr.list")?.is_some();
                let kind = KeyType::parse(&attr_type, list)?;
                if !empty {
                    self.open_key = Some(id.clone());
                }
                self.keys.insert(
                    id,
                    KeyDecl {
                        domain,
                        name,
                        kind,
                        default: None,
                        on_elements,
                    },
                );
            }
            b"default" if self.open_key.is_some() => {
                self.default_text = Some(String::new());
                if empty {
                    self.finish_default()?;
                }
            }
            b"node" => {
                let node = Node::new(node_id(&required(e, "id")?)?);
                self.current = Some(Element::Node(node));
                if empty {
                    self.finish_element();
                }
            }
            b"edge" => {
                let source = node_id(&required(e, "source")?)?;
                let target = node_id(&required(e, "target")?)?;
                self.current = Some(Element::Edge(Edge::new(source, target)));
                if empty {
                    self.finish_element();
                }
            }
            b"data" if self.current.is_some() => {
                self.data = Some((required(e, "key")?, String::new()));
                if empty {
                    self.finish_data()?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some((_, buf)) = self.data.as_mut() {
            buf.push_str(text);
        } else if let Some(buf) = self.default_text.as_mut() {
            buf.push_str(text);
        }
    }

    fn close(&mut self, name: &[u8]) -> PersistenceResult<()> {
        match name {
            b"data" => self.finish_data()?,
            b"default" => self.finish_default()?,
            b"key" => self.open_key = None,
            b"node" | b"edge" => self.finish_element(),
            _ => {}
        }
        Ok(())
    }

    fn finish_default(&mut self) -> PersistenceResult<()> {
        let (Some(text), Some(key)) = (self.default_text.take(), self.open_key.as_ref()) else {
            return Ok(());
        };
        if let Some(decl) = self.keys.get_mut(key) {
            if decl.on_elements {
                decl.default = Some(decl.kind.decode(&text)?);
            }
        }
        Ok(())
    }

    fn finish_data(&mut self) -> PersistenceResult<()> {
        let Some((key, text)) = self.data.take() else {
            return Ok(());
        };
        let Some(element) = self.current.as_mut() else {
            return Ok(());
        };
        let decl = self
            .keys
            .get(&key)
            .ok_or_else(|| PersistenceError::Format(format!("undeclared key {key:?}")))?;
        if decl.domain.is_some_and(|d| d != element.domain()) {
            return Err(PersistenceError::Format(format!(
                "key {key:?} is not declared for <{}>",
                element.domain().as_str()
            )));
        }
        let value = decl.kind.decode(&text)?;
        element.properties_mut().insert(decl.name.clone(), value);
        Ok(())
    }

    fn finish_element(&mut self) {
        let Some(mut element) = self.current.take() else {
            return;
        };

        let domain = element.domain();
        for decl in self.keys.values() {
            let Some(default) = &decl.default else {
                continue;
            };
            if decl.domain.is_some_and(|d| d != domain) {
                continue;
            }
            element
                .properties_mut()
                .entry(decl.name.clone())
                .or_insert_with(|| default.clone());
        }

        match element {
            Element::Node(node) => {
                self.graph.add_node(node.id, node.properties);
            }
            Element::Edge(edge) => {
                self.graph.add_edge(edge.source, edge.target, edge.properties);
            }
        }
    }

    fn finish(self) -> PersistenceResult<SocialGraph> {
        if !self.saw_root {
            return Err(PersistenceError::Format("missing <graphml> root element".to_string()));
        }
        if self.current.is_some() {
            return Err(PersistenceError::Format("unterminated node or edge element".to_string()));
        }
        Ok(self.graph)
    }
}

/// Parse a GraphML document
pub fn parse_graphml(xml: &str) -> PersistenceResult<SocialGraph> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut parser = GraphmlParser::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => parser.open(&e, false)?,
            Event::Empty(e) => parser.open(&e, true)?,
            Event::End(e) => parser.close(e.local_name().as_ref())?,
            Event::Text(t) => parser.text(&t.unescape()?),
            Event::CData(c) => parser.text(&String::from_utf8_lossy(&c.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }

    parser.finish()
}
