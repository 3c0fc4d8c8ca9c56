// src/ports/mod.rs
pub mod html;
pub mod markdown;
pub mod terminal;

pub use html::HtmlPresenter;
