//! Latest-payload rule.

/// Stored instead of the event body when an event carries no data.
pub const UNKNOWN_EVENT_DATA: &str = "UNKNOWN_EVENT_DATA";

/// Payload to publish for an event whose body is `data`.
pub fn payload_from_data(data: &str) -> String {
    if data.is_empty() {
        UNKNOWN_EVENT_DATA.to_string()
    } else {
        data.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_data_passes_through() {
        assert_eq!(payload_from_data("hello"), "hello");
        assert_eq!(payload_from_data(" "), " ");
        assert_eq!(payload_from_data("0"), "0");
    }

    #[test]
    fn test_empty_data_becomes_sentinel() {
        assert_eq!(payload_from_data(""), UNKNOWN_EVENT_DATA);
    }
}
