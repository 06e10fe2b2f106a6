// Small shared utilities

pub mod math;
