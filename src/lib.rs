#![doc(html_root_url = "https://docs.rs/galley-dom/0.1.0")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod api;
pub mod config;
pub mod controller;
pub mod diff;
pub mod dom;
pub mod events;
pub mod load;
pub mod model;
pub mod view;
pub mod views;
