//! Skirmish AI - tactical decision core for a grid-based RTS

pub mod battle;
pub mod core;
pub mod spatial;
