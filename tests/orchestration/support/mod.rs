#![allow(dead_code)]

pub mod scripts;
