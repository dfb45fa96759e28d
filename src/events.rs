//! Typed event dispatch: an explicit registry from event name to an ordered
//! sequence of callbacks, replacing listener side effects threaded through
//! closures.
//!
//! Dispatch is synchronous and runs handlers to completion in registration
//! order; the whole system is single-threaded and cooperative.

use crate::model::RecipeDraft;
use hashbrown::HashMap;
use tracing::trace;

/// Named user interactions the application reacts to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UiEvent {
	/// A recipe was selected (address-fragment navigation or first load).
	RecipeSelected,
	/// The stored bookmarks became available at startup.
	BookmarksRestored,
	/// The search form was submitted.
	SearchSubmitted,
	/// A pagination control was activated.
	PageSelected,
	/// A servings stepper was activated.
	ServingsAdjusted,
	/// The bookmark button was activated.
	BookmarkToggled,
	/// The upload form was submitted.
	RecipeSubmitted,
}

/// Payload delivered alongside a [`UiEvent`].
#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
	None,
	RecipeId(String),
	Page(usize),
	Servings(u32),
	Draft(RecipeDraft),
}

type Handler<C> = Box<dyn FnMut(&mut C, &EventPayload)>;

/// Event-name → ordered-callback registry over an explicit context `C`.
///
/// The context parameter is what the original closure captures become:
/// handlers receive the application state they act on instead of closing
/// over module-level singletons.
pub struct EventRegistry<C> {
	handlers: HashMap<UiEvent, Vec<Handler<C>>>,
}

impl<C> Default for EventRegistry<C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<C> EventRegistry<C> {
	#[must_use]
	pub fn new() -> Self {
		Self { handlers: HashMap::new() }
	}

	/// Appends a callback for `event`. Callbacks run in registration order.
	pub fn add_handler<F>(&mut self, event: UiEvent, handler: F)
	where
		F: FnMut(&mut C, &EventPayload) + 'static,
	{
		self.handlers.entry(event).or_default().push(Box::new(handler));
	}

	/// Invokes every callback registered for `event`, in order, and returns
	/// how many ran.
	pub fn dispatch(&mut self, context: &mut C, event: UiEvent, payload: &EventPayload) -> usize {
		let handlers = match self.handlers.get_mut(&event) {
			Some(handlers) => handlers,
			None => {
				trace!(?event, "No handlers registered.");
				return 0;
			}
		};
		trace!(?event, count = handlers.len(), "Dispatching.");
		for handler in handlers.iter_mut() {
			handler(context, payload);
		}
		handlers.len()
	}

	#[must_use]
	pub fn handler_count(&self, event: UiEvent) -> usize {
		self.handlers.get(&event).map_or(0, Vec::len)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn handlers_run_in_registration_order() {
		let mut registry: EventRegistry<Vec<&'static str>> = EventRegistry::new();
		registry.add_handler(UiEvent::SearchSubmitted, |log, _| log.push("first"));
		registry.add_handler(UiEvent::SearchSubmitted, |log, _| log.push("second"));
		let mut log = Vec::new();
		let ran = registry.dispatch(&mut log, UiEvent::SearchSubmitted, &EventPayload::None);
		assert_eq!(ran, 2);
		assert_eq!(log, vec!["first", "second"]);
	}

	#[test]
	fn unregistered_events_dispatch_to_nobody() {
		let mut registry: EventRegistry<()> = EventRegistry::new();
		assert_eq!(registry.dispatch(&mut (), UiEvent::PageSelected, &EventPayload::Page(2)), 0);
		assert_eq!(registry.handler_count(UiEvent::PageSelected), 0);
	}

	#[test]
	fn payload_reaches_handlers() {
		let mut registry: EventRegistry<Option<usize>> = EventRegistry::new();
		registry.add_handler(UiEvent::PageSelected, |seen, payload| {
			if let EventPayload::Page(page) = payload {
				*seen = Some(*page);
			}
		});
		let mut seen = None;
		registry.dispatch(&mut seen, UiEvent::PageSelected, &EventPayload::Page(3));
		assert_eq!(seen, Some(3));
	}
}
