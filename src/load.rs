//! Constructing detached node trees from markup strings.
//!
//! The parser targets the well-formed markup our own templates generate, with
//! a constrained, practical character set: ASCII tag and attribute names in
//! `[A-Za-z0-9:_-]`, double- or single-quoted (or bare) attribute values,
//! self-closing tags, the standard void-element list, and the five basic
//! character entities. Comments and declarations are skipped.
//!
//! Known limitations (intentional):
//! - No spec parse-error recovery: malformed input is an error, never a
//!   best-effort tree. A failed parse leaves nothing half-built.
//! - No rawtext elements (`<script>`/`<style>` content is not special).
//! - Unknown entities pass through literally.

use crate::dom::{self, NodeData, NodeId, Tree};
use thiserror::Error;
use tracing::trace;

/// Maximum open-element nesting the parser accepts.
pub const MAX_DEPTH: usize = 64;

/// A fatal markup parse failure. There is no partial output.
#[derive(Debug, Error)]
pub enum ParseError {
	#[error("unexpected end of input while parsing <{tag}>")]
	UnexpectedEof { tag: String },

	#[error("invalid character {found:?} in name at byte {at}")]
	InvalidName { found: char, at: usize },

	#[error("expected {expected:?} at byte {at}")]
	Expected { expected: char, at: usize },

	#[error("closing tag </{found}> does not match open <{expected}>")]
	MismatchedClose { expected: String, found: String },

	#[error("closing tag </{found}> without a matching open element")]
	StrayClose { found: String },

	#[error("unclosed element <{tag}> at end of input")]
	UnclosedElement { tag: String },

	#[error("markup nests deeper than {limit} elements")]
	TooDeep { limit: usize },
}

/// Parses markup into a detached [`Tree`].
///
/// Whitespace-only text between tags is kept as text nodes, the same way a
/// freshly parsed document fragment keeps it; element enumeration skips it
/// anyway.
pub fn parse(markup: &str) -> Result<Tree, ParseError> {
	let mut tree = Tree::new();
	let mut stack: Vec<NodeId> = Vec::new();
	let bytes = markup.as_bytes();
	let mut i = 0;

	while i < bytes.len() {
		if bytes[i] != b'<' {
			let start = i;
			while i < bytes.len() && bytes[i] != b'<' {
				i += 1;
			}
			let text = decode_entities(&markup[start..i]);
			if !text.is_empty() {
				let id = tree.alloc(NodeData::Text(text));
				attach(&mut tree, &stack, id);
			}
			continue;
		}

		if markup[i..].starts_with("<!--") {
			match markup[i + 4..].find("-->") {
				Some(end) => i += 4 + end + 3,
				None => return Err(ParseError::UnexpectedEof { tag: "!--".to_owned() }),
			}
			continue;
		}

		if markup[i..].starts_with("<!") {
			// Declarations (doctype) carry no tree content; skip to '>'.
			match bytes[i..].iter().position(|&b| b == b'>') {
				Some(end) => i += end + 1,
				None => return Err(ParseError::UnexpectedEof { tag: "!".to_owned() }),
			}
			continue;
		}

		if markup[i..].starts_with("</") {
			i += 2;
			let (name, next) = read_name(markup, i)?;
			i = next;
			while i < bytes.len() && bytes[i].is_ascii_whitespace() {
				i += 1;
			}
			if i >= bytes.len() || bytes[i] != b'>' {
				return Err(ParseError::Expected { expected: '>', at: i });
			}
			i += 1;
			match stack.pop() {
				Some(open) => {
					let open_tag = tree.tag(open).unwrap_or_default().to_owned();
					if !open_tag.eq_ignore_ascii_case(&name) {
						return Err(ParseError::MismatchedClose { expected: open_tag, found: name });
					}
				}
				None => return Err(ParseError::StrayClose { found: name }),
			}
			continue;
		}

		// Open tag.
		i += 1;
		let (name, next) = read_name(markup, i)?;
		i = next;
		let mut attributes: Vec<(String, String)> = Vec::new();
		let mut self_closing = false;
		loop {
			while i < bytes.len() && bytes[i].is_ascii_whitespace() {
				i += 1;
			}
			if i >= bytes.len() {
				return Err(ParseError::UnexpectedEof { tag: name });
			}
			if bytes[i] == b'>' {
				i += 1;
				break;
			}
			if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>') {
				self_closing = true;
				i += 2;
				break;
			}
			let (attr_name, next) = read_name(markup, i)?;
			i = next;
			while i < bytes.len() && bytes[i].is_ascii_whitespace() {
				i += 1;
			}
			let value = if i < bytes.len() && bytes[i] == b'=' {
				i += 1;
				while i < bytes.len() && bytes[i].is_ascii_whitespace() {
					i += 1;
				}
				if i >= bytes.len() {
					return Err(ParseError::UnexpectedEof { tag: name });
				}
				match bytes[i] {
					quote @ (b'"' | b'\'') => {
						i += 1;
						let start = i;
						while i < bytes.len() && bytes[i] != quote {
							i += 1;
						}
						if i >= bytes.len() {
							return Err(ParseError::UnexpectedEof { tag: name });
						}
						let value = decode_entities(&markup[start..i]);
						i += 1;
						value
					}
					_ => {
						let start = i;
						while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
							i += 1;
						}
						decode_entities(&markup[start..i])
					}
				}
			} else {
				String::new()
			};
			attributes.push((attr_name, value));
		}

		let id = tree.alloc(NodeData::Element {
			tag: name.clone(),
			attributes,
			children: Vec::new(),
		});
		attach(&mut tree, &stack, id);
		if !self_closing && !dom::is_void_element(&name) {
			stack.push(id);
			if stack.len() > MAX_DEPTH {
				return Err(ParseError::TooDeep { limit: MAX_DEPTH });
			}
		}
	}

	if let Some(&open) = stack.last() {
		return Err(ParseError::UnclosedElement {
			tag: tree.tag(open).unwrap_or_default().to_owned(),
		});
	}
	trace!(nodes = tree.len(), "Parsed markup.");
	Ok(tree)
}

fn attach(tree: &mut Tree, stack: &[NodeId], id: NodeId) {
	match stack.last() {
		Some(&parent) => tree.append_child(parent, id),
		None => tree.push_root(id),
	}
}

fn read_name(markup: &str, at: usize) -> Result<(String, usize), ParseError> {
	let bytes = markup.as_bytes();
	let mut i = at;
	while i < bytes.len() && is_name_byte(bytes[i]) {
		i += 1;
	}
	if i == at {
		let found = markup[i..].chars().next().unwrap_or('\0');
		return Err(ParseError::InvalidName { found, at: i });
	}
	Ok((markup[at..i].to_owned(), i))
}

fn is_name_byte(b: u8) -> bool {
	b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-')
}

fn decode_entities(text: &str) -> String {
	if !text.contains('&') {
		return text.to_owned();
	}
	const ENTITIES: [(&str, char); 5] = [
		("&amp;", '&'),
		("&lt;", '<'),
		("&gt;", '>'),
		("&quot;", '"'),
		("&#39;", '\''),
	];
	let mut out = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(pos) = rest.find('&') {
		out.push_str(&rest[..pos]);
		rest = &rest[pos..];
		let mut matched = false;
		for &(entity, replacement) in &ENTITIES {
			if rest.starts_with(entity) {
				out.push(replacement);
				rest = &rest[entity.len()..];
				matched = true;
				break;
			}
		}
		if !matched {
			out.push('&');
			rest = &rest[1..];
		}
	}
	out.push_str(rest);
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_nested_elements_and_text() {
		let tree = parse(r#"<ul class="list"><li id="a">3 servings</li><li id="b">fixed</li></ul>"#).unwrap();
		let elements = tree.elements();
		assert_eq!(elements.len(), 3);
		assert_eq!(tree.tag(elements[0]), Some("ul"));
		assert_eq!(tree.attribute(elements[1], "id"), Some("a"));
		assert_eq!(tree.direct_text(elements[1]), Some("3 servings"));
		assert_eq!(tree.text_content(elements[0]), "3 servingsfixed");
	}

	#[test]
	fn parses_attribute_styles() {
		let tree = parse(r#"<input type="text" value='' disabled data-goto=2>"#).unwrap();
		let input = tree.elements()[0];
		assert_eq!(tree.attribute(input, "type"), Some("text"));
		assert_eq!(tree.attribute(input, "value"), Some(""));
		assert_eq!(tree.attribute(input, "disabled"), Some(""));
		assert_eq!(tree.attribute(input, "data-goto"), Some("2"));
	}

	#[test]
	fn void_and_self_closing_elements_take_no_children() {
		let tree = parse(r#"<div><img src="a.jpg"><br/><span>x</span></div>"#).unwrap();
		let elements = tree.elements();
		assert_eq!(elements.len(), 4);
		assert_eq!(tree.children(elements[1]), &[]);
		assert_eq!(tree.direct_text(elements[3]), Some("x"));
	}

	#[test]
	fn skips_comments_and_declarations() {
		let tree = parse("<!doctype html><!-- note --><p>hi</p>").unwrap();
		assert_eq!(tree.elements().len(), 1);
		assert_eq!(tree.text_content(tree.elements()[0]), "hi");
	}

	#[test]
	fn decodes_basic_entities() {
		let tree = parse(r#"<p title="a &quot;b&quot;">salt &amp; pepper &unknown;</p>"#).unwrap();
		let p = tree.elements()[0];
		assert_eq!(tree.attribute(p, "title"), Some(r#"a "b""#));
		assert_eq!(tree.text_content(p), "salt & pepper &unknown;");
	}

	#[test]
	fn keeps_whitespace_text_nodes() {
		let tree = parse("<div>\n\t<span>x</span>\n</div>").unwrap();
		let div = tree.elements()[0];
		assert_eq!(tree.children(div).len(), 3);
		assert_eq!(tree.direct_text(div), Some("\n\t"));
	}

	#[test]
	fn rejects_malformed_markup() {
		assert!(matches!(parse("<div><span></div>"), Err(ParseError::MismatchedClose { .. })));
		assert!(matches!(parse("<div>"), Err(ParseError::UnclosedElement { .. })));
		assert!(matches!(parse("</div>"), Err(ParseError::StrayClose { .. })));
		assert!(matches!(parse("<div"), Err(ParseError::UnexpectedEof { .. })));
		assert!(matches!(parse("<>"), Err(ParseError::InvalidName { .. })));
	}

	#[test]
	fn depth_limit_is_enforced() {
		let mut markup = String::new();
		for _ in 0..=MAX_DEPTH {
			markup.push_str("<div>");
		}
		assert!(matches!(parse(&markup), Err(ParseError::TooDeep { .. })));
	}

	#[test]
	fn serialization_round_trips_content() {
		let markup = r#"<div class="a"><img src="x.jpg"><p>salt &amp; pepper</p></div>"#;
		let tree = parse(markup).unwrap();
		let reparsed = parse(&tree.to_markup()).unwrap();
		assert!(tree.subtree_eq(tree.roots()[0], &reparsed, reparsed.roots()[0]));
	}
}
