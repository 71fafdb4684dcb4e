//! Minimal arena DOM for the structural pass.
//!
//! Built from quick-xml events. Markup is kept in its escaped source form so
//! that serializing an untouched tree reproduces the input. Entities are
//! never expanded; references other than the predefined XML entities and
//! character references are dropped while parsing. Traversal and
//! serialization are iterative, nesting depth is bounded only by memory.

use std::borrow::Cow;

use quick_xml::{
	escape::unescape,
	events::{attributes::Attribute as XmlAttribute, BytesCData, BytesEnd, BytesStart, BytesText, Event},
	name::QName,
	Reader, Writer,
};

use crate::prelude::*;
use crate::structural::StructuralError;

pub(crate) type NodeId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Attribute {
	pub name: String,
	/// Escaped value, always safe inside double quotes (no raw `"` or `<`)
	pub value: String,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
	Element { name: String, attributes: Vec<Attribute> },
	Text(String),
	CData(String),
	Comment(String),
}

#[derive(Debug)]
pub(crate) struct Node {
	pub kind: NodeKind,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
}

#[derive(Debug, Default)]
pub(crate) struct Document {
	nodes: Vec<Node>,
	root: Option<NodeId>,
}

fn utf8(bytes: &[u8]) -> Result<&str, StructuralError> {
	std::str::from_utf8(bytes).map_err(|e| StructuralError::Parse(e.to_string()))
}

/// Whether `&name;` is something a conforming parser resolves without a DTD.
fn is_builtin_reference(name: &str) -> bool {
	unescape(&format!("&{};", name)).is_ok()
}

impl Document {
	pub fn parse(text: &str) -> Result<Self, StructuralError> {
		let mut reader = Reader::from_str(text);
		reader.config_mut().trim_text(false);

		let mut doc = Document::default();
		let mut stack: Vec<NodeId> = Vec::new();

		loop {
			let event = reader.read_event().map_err(|e| {
				StructuralError::Parse(format!("{} (at byte {})", e, reader.error_position()))
			})?;
			match event {
				Event::Start(e) => {
					let id = doc.push_element(&e, stack.last().copied())?;
					stack.push(id);
				}
				Event::Empty(e) => {
					doc.push_element(&e, stack.last().copied())?;
				}
				Event::End(_) => {
					stack.pop();
				}
				Event::Text(t) => {
					if let Some(&parent) = stack.last() {
						let raw = utf8(&t)?;
						if unescape(raw).is_ok() {
							doc.push(NodeKind::Text(raw.to_string()), Some(parent));
						} else {
							debug!("Dropping text node with unresolvable reference");
						}
					}
				}
				Event::GeneralRef(r) => {
					if let Some(&parent) = stack.last() {
						let name = utf8(&r)?;
						if is_builtin_reference(name) {
							doc.push(NodeKind::Text(format!("&{};", name)), Some(parent));
						} else {
							debug!("Dropping entity reference &{};", name);
						}
					}
				}
				Event::CData(c) => {
					if let Some(&parent) = stack.last() {
						doc.push(NodeKind::CData(utf8(&c)?.to_string()), Some(parent));
					}
				}
				Event::Comment(c) => {
					if let Some(&parent) = stack.last() {
						doc.push(NodeKind::Comment(utf8(&c)?.to_string()), Some(parent));
					}
				}
				// Declarations, DTDs and processing instructions never reach the output
				Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
				Event::Eof => break,
			}
		}

		if !stack.is_empty() {
			return Err(StructuralError::Unbalanced(stack.len()));
		}
		Ok(doc)
	}

	fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
		let id = self.nodes.len();
		self.nodes.push(Node { kind, parent, children: Vec::new() });
		if let Some(parent) = parent {
			self.nodes[parent].children.push(id);
		}
		id
	}

	fn push_element(&mut self, e: &BytesStart, parent: Option<NodeId>) -> Result<NodeId, StructuralError> {
		if parent.is_none() && self.root.is_some() {
			return Err(StructuralError::Parse("multiple root elements".into()));
		}

		let name = utf8(e.name().as_ref())?.to_string();
		let mut attributes = Vec::new();
		for attr in e.attributes() {
			let attr = attr.map_err(|e| StructuralError::Parse(e.to_string()))?;
			attributes.push(Attribute {
				name: utf8(attr.key.as_ref())?.to_string(),
				value: utf8(&attr.value)?.replace('"', "&quot;").replace('<', "&lt;"),
			});
		}

		let id = self.push(NodeKind::Element { name, attributes }, parent);
		if parent.is_none() {
			self.root = Some(id);
		}
		Ok(id)
	}

	pub fn root(&self) -> Option<NodeId> {
		self.root
	}

	pub fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id]
	}

	pub fn element_name(&self, id: NodeId) -> Option<&str> {
		match &self.nodes[id].kind {
			NodeKind::Element { name, .. } => Some(name),
			_ => None,
		}
	}

	pub fn attributes_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attribute>> {
		match &mut self.nodes[id].kind {
			NodeKind::Element { attributes, .. } => Some(attributes),
			_ => None,
		}
	}

	/// Element ids below (and including) `from`, in document order.
	pub fn elements(&self, from: NodeId) -> Vec<NodeId> {
		let mut result = Vec::new();
		let mut stack = vec![from];
		while let Some(id) = stack.pop() {
			let node = &self.nodes[id];
			if let NodeKind::Element { .. } = node.kind {
				result.push(id);
				stack.extend(node.children.iter().rev());
			}
		}
		result
	}

	/// Detach a node (and thereby its subtree) from its parent.
	pub fn detach(&mut self, id: NodeId) {
		match self.nodes[id].parent.take() {
			Some(parent) => self.nodes[parent].children.retain(|&child| child != id),
			None => {
				if self.root == Some(id) {
					self.root = None;
				}
			}
		}
	}

	/// Serialize the subtree rooted at `id`.
	pub fn serialize(&self, id: NodeId) -> Result<String, StructuralError> {
		let mut writer = Writer::new(Vec::new());
		let mut stack = vec![(id, false)];

		while let Some((id, closing)) = stack.pop() {
			let node = &self.nodes[id];
			let event = match &node.kind {
				NodeKind::Element { name, .. } if closing => Event::End(BytesEnd::new(name.as_str())),
				NodeKind::Element { name, attributes } => {
					let mut start = BytesStart::new(name.as_str());
					for attr in attributes {
						start.push_attribute(XmlAttribute {
							key: QName(attr.name.as_bytes()),
							value: Cow::Borrowed(attr.value.as_bytes()),
						});
					}
					if node.children.is_empty() {
						Event::Empty(start)
					} else {
						stack.push((id, true));
						stack.extend(node.children.iter().rev().map(|&child| (child, false)));
						Event::Start(start)
					}
				}
				NodeKind::Text(text) => Event::Text(BytesText::from_escaped(text.as_str())),
				NodeKind::CData(data) => Event::CData(BytesCData::new(data.as_str())),
				NodeKind::Comment(text) => Event::Comment(BytesText::from_escaped(text.as_str())),
			};
			writer.write_event(event).map_err(|e| StructuralError::Serialize(e.to_string()))?;
		}

		String::from_utf8(writer.into_inner()).map_err(|e| StructuralError::Serialize(e.to_string()))
	}
}


// vim: ts=4
