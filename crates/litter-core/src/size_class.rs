use crate::error::LitterError;

/// Largest size bucketed by the `under-4096` scheme.
pub const UNDER_4096_MAX: usize = 4096;

/// The named size-class schemes a profiler run can be configured with via
/// `LITTER_SIZE_CLASSES`. `under-4096` is the only scheme this
/// implementation must provide; unknown names fail the process per the
/// profiler's initialization contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeClassScheme {
    #[default]
    Under4096,
}

impl SizeClassScheme {
    pub fn parse(name: &str) -> Result<Self, LitterError> {
        match name {
            "under-4096" => Ok(Self::Under4096),
            other => Err(LitterError::Configuration(format!(
                "unknown size class scheme: {other}"
            ))),
        }
    }

    /// Generate the strictly increasing `sizeClasses` table for this scheme.
    pub fn table(&self) -> Vec<usize> {
        match self {
            Self::Under4096 => (1..=UNDER_4096_MAX).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_4096_table_is_strictly_increasing_and_starts_at_one() {
        let table = SizeClassScheme::Under4096.table();
        assert_eq!(table.len(), UNDER_4096_MAX);
        assert_eq!(table[0], 1);
        assert_eq!(table[UNDER_4096_MAX - 1], UNDER_4096_MAX);
        assert!(table.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn unknown_scheme_is_a_configuration_error() {
        let err = SizeClassScheme::parse("under-65536").unwrap_err();
        assert!(matches!(err, LitterError::Configuration(_)));
    }
}
