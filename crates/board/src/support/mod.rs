#![forbid(unsafe_code)]

mod ai;
mod args;
mod time;

pub(crate) use ai::*;
pub(crate) use args::*;
pub(crate) use time::*;
