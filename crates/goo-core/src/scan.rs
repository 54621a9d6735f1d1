//! Post-convergence inspection hook.
//!
//! The resolver hands the finished table to a [`MappingScan`] after the
//! final phase. What a scan looks for (profitable conversion loops, uneven
//! yields) is up to the implementation; the default does nothing.

use crate::mapping::Mappings;

pub trait MappingScan: std::fmt::Debug {
    fn scan(&mut self, mappings: &Mappings);
}

/// The default scan. Inspects nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScan;

impl MappingScan for NoopScan {
    fn scan(&mut self, _mappings: &Mappings) {}
}
