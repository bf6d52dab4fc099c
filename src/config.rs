//! Construction-time configuration (SPEC_FULL §2 "Configuration").
//!
//! No environment variables or files are consulted anywhere in this crate
//! (spec §6); every tunable is passed in explicitly at `Stack` construction.

/// Growth and capacity knobs for a `Stack`'s value array (spec §5:
/// "Growth of the value array uses 1.5x amplification capped at an
/// implementation-defined maximum; exceeding the cap is a fatal
/// out-of-memory").
#[derive(Clone, Debug, PartialEq)]
pub struct StackConfig {
    /// Number of cells the value array is pre-sized for.
    pub initial_capacity: usize,
    /// Amplification factor applied each time the value array must grow.
    pub growth_factor: f64,
    /// Hard ceiling on the value array's capacity. Exceeding it aborts the
    /// process (spec §5); it is not a recoverable `StackError`.
    pub max_capacity: usize,
    /// Operator table capacity passed to `OperatorTable::new`. Must be at
    /// least `opcode::PREDEFINED_COUNT`.
    pub operator_table_capacity: usize,
}

impl Default for StackConfig {
    fn default() -> Self {
        StackConfig {
            initial_capacity: 64,
            growth_factor: 1.5,
            max_capacity: 1 << 20,
            operator_table_capacity: crate::opcode::DEFAULT_CAPACITY,
        }
    }
}

impl StackConfig {
    pub fn with_operator_table_capacity(mut self, capacity: usize) -> Self {
        self.operator_table_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_covers_predefined_opcodes() {
        let config = StackConfig::default();
        assert!(config.operator_table_capacity >= crate::opcode::PREDEFINED_COUNT);
    }
}
