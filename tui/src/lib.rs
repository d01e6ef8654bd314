//! Terminal session engine for the shop.
//!
//! A [`Session`] is a pure state machine: [`Session::update`] consumes one [`Msg`] and
//! returns the next session plus the [`Command`]s to run. The transport owns a
//! [`Dispatcher`] that runs those commands and feeds their results back in, and calls
//! [`draw`] after every update.

mod chrome;
pub mod command;
mod form;
mod keys;
pub mod layout;
pub mod msg;
pub mod page;
mod pages;
mod selection;
mod session;
#[cfg(test)]
mod testing;
mod text;
mod theme;
mod validate;
pub mod view;
mod viewport;

pub use crate::command::{Command, Dispatcher};
pub use crate::layout::{Breakpoint, Layout};
pub use crate::msg::Msg;
pub use crate::page::Page;
pub use crate::pages::faq::Faq;
pub use crate::session::{Identity, Services, Session};
pub use crate::view::draw;
