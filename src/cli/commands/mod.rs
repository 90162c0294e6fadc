//! One module per `egg` subcommand.

pub mod add;
pub mod delete;
pub mod get;
pub mod init;
pub mod inspect;
pub mod list;
pub mod run;
