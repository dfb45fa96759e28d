//! Incremental reconciliation of a mounted tree against freshly generated
//! markup.
//!
//! The engine pairs elements of the candidate and the mounted tree purely by
//! position (pre-order, depth-first ordinal) and mutates only pairs that are
//! not already equal. Equal pairs are never touched, which is the whole
//! point: untouched nodes keep their identity and therefore their live state
//! (focus, scroll, transition progress, decoded images).
//!
//! # Correct use
//!
//! Positional pairing only means anything when both trees have congruent
//! structure: same element count and nesting in pre-order. That holds when
//! both come from the same generator over same-shaped data, and it is the
//! caller's obligation. The engine does not detect violations; it degrades by
//! truncating the pairing to the shorter sequence (excess candidate elements
//! are ignored, never inserted; excess mounted elements are left alone) and
//! the visual result of a badly incongruent call is undefined.

use crate::dom::{NodeId, Tree};
use crate::load::{self, ParseError};
use tracing::{error, instrument, trace, trace_span, warn};

/// Reconciles the mounted tree in place so its content matches `candidate`.
///
/// Per unequal pair, two one-directional updates are applied:
///
/// - **Text**: if the candidate element's direct text (first child, text
///   node) is non-empty after trimming and the text content differs, the
///   mounted element's text content is overwritten. Elements whose candidate
///   first child is not a text node, or is whitespace-only, are exempt, so
///   element children are never clobbered by an empty string.
/// - **Attributes**: every candidate attribute is written onto the mounted
///   element when its value differs or it is missing. Attributes only
///   present on the mounted element are *not* removed; attribute removal is
///   unsupported.
#[instrument(skip(mounted, candidate))]
pub fn reconcile(mounted: &mut Tree, candidate: &Tree) {
	let new_elements = candidate.elements();
	let current_elements = mounted.elements();
	if new_elements.len() != current_elements.len() {
		warn!(
			candidate = new_elements.len(),
			mounted = current_elements.len(),
			"Element counts diverge; pairing truncated to the shorter sequence."
		);
	}

	for (i, (&new_element, &current_element)) in new_elements.iter().zip(&current_elements).enumerate() {
		let span = trace_span!("Pairing elements", i);
		let _enter = span.enter();

		if mounted.get(current_element).is_none() {
			// An earlier text overwrite dropped this node together with its
			// parent's children. The stale pairing entry is skipped, the same
			// way a detached node in a stale element list would be written to
			// without visible effect.
			error!("Mounted element vanished mid-pass; skipping.");
			continue;
		}

		if candidate.subtree_eq(new_element, mounted, current_element) {
			trace!("Equal subtrees; leaving the mounted element untouched.");
			continue;
		}

		update_text(mounted, current_element, candidate, new_element);
		update_attributes(mounted, current_element, candidate, new_element);
	}
}

/// Parses `candidate_markup` and reconciles it into `mounted`.
///
/// Malformed markup is fatal: the error propagates and the mounted tree is
/// left exactly as it was, with no partial reconciliation.
pub fn reconcile_markup(mounted: &mut Tree, candidate_markup: &str) -> Result<(), ParseError> {
	let candidate = load::parse(candidate_markup)?;
	reconcile(mounted, &candidate);
	Ok(())
}

fn update_text(mounted: &mut Tree, current_element: NodeId, candidate: &Tree, new_element: NodeId) {
	let direct = match candidate.direct_text(new_element) {
		Some(direct) => direct,
		None => return,
	};
	if direct.trim().is_empty() {
		return;
	}
	let new_text = candidate.text_content(new_element);
	if mounted.text_content(current_element) == new_text {
		return;
	}
	if cfg!(feature = "dangerous-logging") {
		trace!(text = %new_text, "Overwriting text content.");
	} else {
		trace!(len = new_text.len(), "Overwriting text content.");
	}
	if !mounted.set_text_content(current_element, &new_text) {
		error!("Failed to overwrite text content.");
	}
}

fn update_attributes(mounted: &mut Tree, current_element: NodeId, candidate: &Tree, new_element: NodeId) {
	for (name, value) in candidate.attributes(new_element) {
		match mounted.attribute(current_element, name) {
			Some(current) if current == value => {}
			_ => {
				trace!(name = %name, "Overwriting attribute.");
				if !mounted.set_attribute(current_element, name, value) {
					error!(name = %name, "Failed to overwrite attribute.");
				}
			}
		}
	}
}
