//! A portable rendered tree: the live representation mounted under a container.
//!
//! Nodes live in an id-keyed arena so that identity is observable across
//! reconciliation: an id handed out once is never reused by the same [`Tree`],
//! and in-place content mutation leaves ids untouched. This is what lets the
//! diff layer guarantee that untouched nodes keep their live state.

use hashbrown::HashMap;
use tracing::error;

/// Opaque identity of one node within its [`Tree`].
///
/// Ids are allocated monotonically and never reused, including across a
/// [`Tree::clear`]. Two trees hand out overlapping ids; an id is only
/// meaningful together with the tree that produced it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(u64);

/// Content of one node: an element with tag, attributes and children, or text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeData {
	Element {
		tag: String,
		/// Attribute pairs in document order. Lookups are linear; attribute
		/// lists in real markup are short.
		attributes: Vec<(String, String)>,
		children: Vec<NodeId>,
	},
	Text(String),
}

/// An ordered forest of nodes under one container.
///
/// The tree tracks every content write through [`Tree::mutations`], so tests
/// and callers can observe that an operation touched nothing.
#[derive(Debug, Default)]
pub struct Tree {
	nodes: HashMap<NodeId, NodeData>,
	roots: Vec<NodeId>,
	next_id: u64,
	mutations: u64,
}

impl Tree {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
		let id = NodeId(self.next_id);
		self.next_id += 1;
		self.nodes.insert(id, data);
		self.mutations += 1;
		id
	}

	pub(crate) fn push_root(&mut self, id: NodeId) {
		self.roots.push(id);
	}

	pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
		match self.nodes.get_mut(&parent) {
			Some(NodeData::Element { children, .. }) => children.push(child),
			Some(NodeData::Text(_)) | None => error!("Cannot append below a text node or missing node."),
		}
	}

	#[must_use]
	pub fn roots(&self) -> &[NodeId] {
		&self.roots
	}

	#[must_use]
	pub fn get(&self, id: NodeId) -> Option<&NodeData> {
		self.nodes.get(&id)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.roots.is_empty()
	}

	/// Count of content writes (node creation, text overwrite, attribute
	/// write, clear) performed on this tree so far.
	#[must_use]
	pub fn mutations(&self) -> u64 {
		self.mutations
	}

	/// All element nodes in document order: pre-order, depth-first,
	/// left-to-right. Text nodes are not listed.
	#[must_use]
	pub fn elements(&self) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
		while let Some(id) = stack.pop() {
			if let Some(NodeData::Element { children, .. }) = self.nodes.get(&id) {
				out.push(id);
				stack.extend(children.iter().rev().copied());
			}
		}
		out
	}

	#[must_use]
	pub fn tag(&self, id: NodeId) -> Option<&str> {
		match self.nodes.get(&id)? {
			NodeData::Element { tag, .. } => Some(tag),
			NodeData::Text(_) => None,
		}
	}

	#[must_use]
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		match self.nodes.get(&id) {
			Some(NodeData::Element { children, .. }) => children,
			Some(NodeData::Text(_)) | None => &[],
		}
	}

	#[must_use]
	pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
		match self.nodes.get(&id) {
			Some(NodeData::Element { attributes, .. }) => attributes,
			Some(NodeData::Text(_)) | None => &[],
		}
	}

	#[must_use]
	pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
		self.attributes(id).iter().find(|attr| attr.0 == name).map(|attr| attr.1.as_str())
	}

	/// Direct text of an element: the value of its first child, if that child
	/// is a text node. `None` for text nodes, childless elements, and
	/// elements whose first child is itself an element.
	#[must_use]
	pub fn direct_text(&self, id: NodeId) -> Option<&str> {
		match self.nodes.get(&id)? {
			NodeData::Element { children, .. } => match self.nodes.get(children.first()?)? {
				NodeData::Text(text) => Some(text),
				NodeData::Element { .. } => None,
			},
			NodeData::Text(_) => None,
		}
	}

	/// Concatenated descendant text in document order.
	#[must_use]
	pub fn text_content(&self, id: NodeId) -> String {
		let mut out = String::new();
		let mut stack = vec![id];
		while let Some(id) = stack.pop() {
			match self.nodes.get(&id) {
				Some(NodeData::Text(text)) => out.push_str(text),
				Some(NodeData::Element { children, .. }) => stack.extend(children.iter().rev().copied()),
				None => {}
			}
		}
		out
	}

	/// Overwrites an element's text content: all existing children are
	/// dropped and replaced by a single fresh text node.
	///
	/// Returns `false` (after logging) when `id` is not a live element.
	pub fn set_text_content(&mut self, id: NodeId, text: &str) -> bool {
		let old_children = match self.nodes.get_mut(&id) {
			Some(NodeData::Element { children, .. }) => core::mem::take(children),
			Some(NodeData::Text(_)) => {
				error!("Cannot set text content on a text node.");
				return false;
			}
			None => {
				error!("Cannot set text content on a missing node.");
				return false;
			}
		};
		for child in old_children {
			self.remove_subtree(child);
		}
		let text_id = self.alloc(NodeData::Text(text.to_owned()));
		if let Some(NodeData::Element { children, .. }) = self.nodes.get_mut(&id) {
			children.push(text_id);
		}
		self.mutations += 1;
		true
	}

	/// Sets or overwrites one attribute. There is no removal counterpart;
	/// attribute sync across trees is one-directional.
	///
	/// Returns `false` (after logging) when `id` is not a live element.
	pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
		match self.nodes.get_mut(&id) {
			Some(NodeData::Element { attributes, .. }) => {
				match attributes.iter_mut().find(|attr| attr.0 == name) {
					Some(attr) => attr.1 = value.to_owned(),
					None => attributes.push((name.to_owned(), value.to_owned())),
				}
				self.mutations += 1;
				true
			}
			Some(NodeData::Text(_)) => {
				error!("Cannot set an attribute on a text node.");
				false
			}
			None => {
				error!("Cannot set an attribute on a missing node.");
				false
			}
		}
	}

	/// Full-subtree equality across trees: same tags, same attribute sets
	/// (order-insensitive, as node equality in browsers has it), same text,
	/// same child shape. Ids never participate.
	#[must_use]
	pub fn subtree_eq(&self, id: NodeId, other: &Tree, other_id: NodeId) -> bool {
		let mut stack = vec![(id, other_id)];
		while let Some((a, b)) = stack.pop() {
			match (self.nodes.get(&a), other.nodes.get(&b)) {
				(Some(NodeData::Text(text_a)), Some(NodeData::Text(text_b))) => {
					if text_a != text_b {
						return false;
					}
				}
				(
					Some(NodeData::Element { tag: tag_a, attributes: attrs_a, children: children_a }),
					Some(NodeData::Element { tag: tag_b, attributes: attrs_b, children: children_b }),
				) => {
					if tag_a != tag_b || children_a.len() != children_b.len() || !attributes_eq(attrs_a, attrs_b) {
						return false;
					}
					stack.extend(children_a.iter().copied().zip(children_b.iter().copied()));
				}
				_ => return false,
			}
		}
		true
	}

	/// Drops every node. Ids keep counting up, so nodes mounted later are
	/// distinguishable from anything that lived here before.
	pub fn clear(&mut self) {
		self.nodes.clear();
		self.roots.clear();
		self.mutations += 1;
	}

	/// Deep-copies another tree's forest to the end of this one's root list,
	/// under fresh ids.
	pub fn adopt(&mut self, other: &Tree) {
		let roots = other.roots.clone();
		for root in roots {
			if let Some(id) = self.copy_from(other, root) {
				self.roots.push(id);
			}
		}
	}

	fn copy_from(&mut self, other: &Tree, id: NodeId) -> Option<NodeId> {
		match other.nodes.get(&id) {
			Some(NodeData::Text(text)) => {
				let text = text.clone();
				Some(self.alloc(NodeData::Text(text)))
			}
			Some(NodeData::Element { tag, attributes, children }) => {
				let tag = tag.clone();
				let attributes = attributes.clone();
				let child_ids = children.clone();
				let new_id = self.alloc(NodeData::Element {
					tag,
					attributes,
					children: Vec::with_capacity(child_ids.len()),
				});
				for child in child_ids {
					if let Some(copied) = self.copy_from(other, child) {
						if let Some(NodeData::Element { children, .. }) = self.nodes.get_mut(&new_id) {
							children.push(copied);
						}
					}
				}
				Some(new_id)
			}
			None => {
				error!("Cannot copy a missing node.");
				None
			}
		}
	}

	fn remove_subtree(&mut self, id: NodeId) {
		let mut stack = vec![id];
		while let Some(id) = stack.pop() {
			if let Some(NodeData::Element { children, .. }) = self.nodes.remove(&id) {
				stack.extend(children);
			}
		}
	}

	/// First element whose `class` attribute contains `class` as a
	/// whitespace-separated token.
	#[must_use]
	pub fn element_with_class(&self, class: &str) -> Option<NodeId> {
		self.elements().into_iter().find(|&id| {
			self.attribute(id, "class")
				.map_or(false, |value| value.split_ascii_whitespace().any(|token| token == class))
		})
	}

	/// First element carrying the given attribute value.
	#[must_use]
	pub fn element_with_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
		self.elements().into_iter().find(|&id| self.attribute(id, name) == Some(value))
	}

	/// Serializes the forest back to markup. Intended for inspection and
	/// tests; the output re-parses to a content-equal tree.
	#[must_use]
	pub fn to_markup(&self) -> String {
		let mut out = String::new();
		for &root in &self.roots {
			self.write_node(root, &mut out);
		}
		out
	}

	fn write_node(&self, id: NodeId, out: &mut String) {
		match self.nodes.get(&id) {
			Some(NodeData::Text(text)) => out.push_str(&escape_text(text)),
			Some(NodeData::Element { tag, attributes, children }) => {
				out.push('<');
				out.push_str(tag);
				for (name, value) in attributes {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					out.push_str(&escape_attribute(value));
					out.push('"');
				}
				out.push('>');
				if is_void_element(tag) {
					return;
				}
				for &child in children {
					self.write_node(child, out);
				}
				out.push_str("</");
				out.push_str(tag);
				out.push('>');
			}
			None => error!("Cannot serialize a missing node."),
		}
	}
}

fn attributes_eq(a: &[(String, String)], b: &[(String, String)]) -> bool {
	a.len() == b.len() && a.iter().all(|(name, value)| b.iter().any(|(n, v)| n == name && v == value))
}

/// Elements that never have children or a closing tag.
#[must_use]
pub fn is_void_element(name: &str) -> bool {
	matches!(
		name,
		"area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "param" | "source" | "track" | "wbr"
	)
}

/// Escapes text content for markup output.
#[must_use]
pub fn escape_text(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			_ => out.push(c),
		}
	}
	out
}

/// Escapes an attribute value for double-quoted markup output.
#[must_use]
pub fn escape_attribute(value: &str) -> String {
	let mut out = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			_ => out.push(c),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn leaf(tree: &mut Tree, tag: &str, text: &str) -> NodeId {
		let id = tree.alloc(NodeData::Element {
			tag: tag.to_owned(),
			attributes: Vec::new(),
			children: Vec::new(),
		});
		let text_id = tree.alloc(NodeData::Text(text.to_owned()));
		tree.append_child(id, text_id);
		id
	}

	#[test]
	fn elements_are_preorder() {
		let mut tree = Tree::new();
		let outer = tree.alloc(NodeData::Element {
			tag: "div".to_owned(),
			attributes: Vec::new(),
			children: Vec::new(),
		});
		tree.push_root(outer);
		let first = leaf(&mut tree, "span", "a");
		let second = leaf(&mut tree, "span", "b");
		tree.append_child(outer, first);
		tree.append_child(outer, second);
		assert_eq!(tree.elements(), vec![outer, first, second]);
	}

	#[test]
	fn set_text_content_drops_old_children() {
		let mut tree = Tree::new();
		let outer = tree.alloc(NodeData::Element {
			tag: "div".to_owned(),
			attributes: Vec::new(),
			children: Vec::new(),
		});
		tree.push_root(outer);
		let inner = leaf(&mut tree, "span", "old");
		tree.append_child(outer, inner);
		assert!(tree.set_text_content(outer, "new"));
		assert_eq!(tree.text_content(outer), "new");
		assert!(tree.get(inner).is_none());
		assert_eq!(tree.elements(), vec![outer]);
	}

	#[test]
	fn ids_are_not_reused_after_clear() {
		let mut tree = Tree::new();
		let before = tree.alloc(NodeData::Text("x".to_owned()));
		tree.push_root(before);
		tree.clear();
		let after = tree.alloc(NodeData::Text("y".to_owned()));
		assert_ne!(before, after);
	}

	#[test]
	fn subtree_eq_ignores_attribute_order() {
		let mut a = Tree::new();
		let left = a.alloc(NodeData::Element {
			tag: "div".to_owned(),
			attributes: vec![("id".to_owned(), "x".to_owned()), ("class".to_owned(), "c".to_owned())],
			children: Vec::new(),
		});
		a.push_root(left);
		let mut b = Tree::new();
		let right = b.alloc(NodeData::Element {
			tag: "div".to_owned(),
			attributes: vec![("class".to_owned(), "c".to_owned()), ("id".to_owned(), "x".to_owned())],
			children: Vec::new(),
		});
		b.push_root(right);
		assert!(a.subtree_eq(left, &b, right));
	}
}
