// Token domain module

#![allow(clippy::module_inception)]

pub mod token;

pub use token::{Token, TokenAction, TokenAttributes};
