use crate::event::Level;

/// Map a [`Level`] to the canonical severity string the collector expects.
///
/// Total and deterministic; levels this build does not recognize map to
/// `"INFORMATION"`.
pub fn severity_of(level: Level) -> &'static str {
    match level {
        Level::Debug => "DEBUG",
        Level::Error => "ERROR",
        Level::Fatal => "FATAL",
        Level::Verbose => "VERBOSE",
        Level::Warning => "WARNING",
        _ => "INFORMATION",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_six_levels_map_to_their_literal() {
        assert_eq!(severity_of(Level::Verbose), "VERBOSE");
        assert_eq!(severity_of(Level::Debug), "DEBUG");
        assert_eq!(severity_of(Level::Information), "INFORMATION");
        assert_eq!(severity_of(Level::Warning), "WARNING");
        assert_eq!(severity_of(Level::Error), "ERROR");
        assert_eq!(severity_of(Level::Fatal), "FATAL");
    }

    #[test]
    fn unknown_level_names_end_up_as_information() {
        assert_eq!(severity_of(Level::from_name("made-up")), "INFORMATION");
    }
}
