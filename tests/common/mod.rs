#![allow(dead_code)]

pub mod eval;
pub mod fixtures;
