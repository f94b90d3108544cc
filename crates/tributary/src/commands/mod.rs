//! Commands that act on the workspace before an [`App`](crate::app::App) exists.

pub mod init;
