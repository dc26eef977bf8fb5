use shared::EntityId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("No dog is currently selected")]
    NoSelectedDog,
    #[error("{0} dogs are flagged as selected")]
    MultipleSelectedDogs(usize),
    #[error("Dog not found: {0}")]
    DogNotFound(EntityId),
}

/// Parse an integer-as-string field. Anything unparseable counts as zero.
pub fn parse_count(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_count_defaults_to_zero() {
        assert_eq!(parse_count("30"), 30);
        assert_eq!(parse_count(" 45 "), 45);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("a lot"), 0);
        assert_eq!(parse_count("12.5"), 0);
    }
}
