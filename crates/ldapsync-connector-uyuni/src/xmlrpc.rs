//! XML-RPC codec
//!
//! Encodes `methodCall` documents and decodes `methodResponse` documents
//! into [`Value`] trees. Only the subset of XML-RPC spoken by the Uyuni
//! API is covered, which in practice is all of it.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use std::fmt::Write;

use ldapsync_connector::error::{ConnectorError, ConnectorResult};

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    String(String),
    Double(f64),
    /// `dateTime.iso8601`, kept verbatim.
    DateTime(String),
    /// `base64`, kept encoded.
    Base64(String),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Nil,
}

impl Value {
    /// Name of the XML-RPC type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
            Value::Double(_) => "double",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Base64(_) => "base64",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Nil => "nil",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Member of a struct value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(key),
            _ => None,
        }
    }

    fn encode_into(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::Int(i) => {
                let _ = write!(out, "<int>{i}</int>");
            }
            Value::Bool(b) => {
                let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
            }
            Value::String(s) => {
                let _ = write!(out, "<string>{}</string>", escape(s.as_str()));
            }
            Value::Double(d) => {
                let _ = write!(out, "<double>{d}</double>");
            }
            Value::DateTime(s) => {
                let _ = write!(out, "<dateTime.iso8601>{}</dateTime.iso8601>", escape(s.as_str()));
            }
            Value::Base64(s) => {
                let _ = write!(out, "<base64>{}</base64>", escape(s.as_str()));
            }
            Value::Array(items) => {
                out.push_str("<array><data>");
                for item in items {
                    item.encode_into(out);
                }
                out.push_str("</data></array>");
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    let _ = write!(out, "<member><name>{}</name>", escape(name.as_str()));
                    value.encode_into(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
            Value::Nil => out.push_str("<nil/>"),
        }
        out.push_str("</value>");
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Decoded `methodResponse`.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Fault { code: i64, message: String },
}

impl MethodResponse {
    /// Turn a fault into [`ConnectorError::RemoteFault`].
    pub fn into_result(self) -> ConnectorResult<Value> {
        match self {
            MethodResponse::Success(value) => Ok(value),
            MethodResponse::Fault { code, message } => {
                Err(ConnectorError::RemoteFault { code, message })
            }
        }
    }
}

/// Encode a `methodCall` document.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from(r#"<?xml version="1.0"?><methodCall><methodName>"#);
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.encode_into(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Decode a `methodResponse` document.
pub fn parse_response(xml: &str) -> ConnectorResult<MethodResponse> {
    let root = parse_tree(xml)?;
    if root.name != "methodResponse" {
        return Err(ConnectorError::invalid_data(format!(
            "expected methodResponse, found <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let value = fault
            .child("value")
            .ok_or_else(|| ConnectorError::invalid_data("fault without value"))
            .and_then(decode_value)?;
        let code = value
            .get("faultCode")
            .and_then(Value::as_i64)
            .ok_or_else(|| ConnectorError::invalid_data("fault without integer faultCode"))?;
        let message = value
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Ok(MethodResponse::Fault { code, message });
    }

    let params = root
        .child("params")
        .ok_or_else(|| ConnectorError::invalid_data("methodResponse without params or fault"))?;

    match params.child("param").and_then(|p| p.child("value")) {
        Some(value) => decode_value(value).map(MethodResponse::Success),
        None => Ok(MethodResponse::Success(Value::Nil)),
    }
}

/// Element tree of a parsed document. Text of mixed content is concatenated.
#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn parse_tree(xml: &str) -> ConnectorResult<Node> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                stack.push(Node::new(name));
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                attach(&mut stack, &mut root, Node::new(name))?;
            }
            Ok(Event::Text(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = e.unescape().map_err(|err| {
                        ConnectorError::invalid_data(format!("invalid XML text: {err}"))
                    })?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(top) = stack.last_mut() {
                    let bytes = e.clone().into_inner();
                    top.text.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| ConnectorError::invalid_data("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ConnectorError::invalid_data(format!(
                    "malformed XML-RPC document: {e}"
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ConnectorError::invalid_data(format!(
            "unclosed element <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| ConnectorError::invalid_data("empty XML-RPC document"))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> ConnectorResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(ConnectorError::invalid_data(
            "more than one root element",
        ));
    }
    *root = Some(node);
    Ok(())
}

fn decode_value(node: &Node) -> ConnectorResult<Value> {
    // A value without a type element is a string.
    let Some(typed) = node.children.first() else {
        return Ok(Value::String(node.text.clone()));
    };

    let text = typed.text.trim();
    match typed.name.as_str() {
        "int" | "i4" | "i8" => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ConnectorError::invalid_data(format!("invalid integer '{text}'"))),
        "boolean" => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(ConnectorError::invalid_data(format!(
                "invalid boolean '{other}'"
            ))),
        },
        "string" => Ok(Value::String(typed.text.clone())),
        "double" => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| ConnectorError::invalid_data(format!("invalid double '{text}'"))),
        "dateTime.iso8601" => Ok(Value::DateTime(text.to_string())),
        "base64" => Ok(Value::Base64(text.to_string())),
        "nil" => Ok(Value::Nil),
        "array" => {
            let data = typed
                .child("data")
                .ok_or_else(|| ConnectorError::invalid_data("array without data"))?;
            data.children_named("value")
                .map(decode_value)
                .collect::<ConnectorResult<Vec<_>>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children_named("member") {
                let name = member
                    .child("name")
                    .ok_or_else(|| ConnectorError::invalid_data("struct member without name"))?;
                let value = member
                    .child("value")
                    .ok_or_else(|| ConnectorError::invalid_data("struct member without value"))?;
                members.insert(name.text.clone(), decode_value(value)?);
            }
            Ok(Value::Struct(members))
        }
        other => Err(ConnectorError::invalid_data(format!(
            "unsupported XML-RPC type <{other}>"
        ))),
    }
}
