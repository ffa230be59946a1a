// Query string decoding that keeps repeated keys (`?location=a&location=b`)

use url::form_urlencoded;

/// Decoded `(key, value)` pairs in query order. Keys without `=` get an empty value.
pub fn parse_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.unwrap_or_default().as_bytes())
        .into_owned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys_are_kept_in_order() {
        let pairs = parse_pairs(Some("location=NO081&status=ACTIVE&location=Viken"));
        assert_eq!(
            pairs,
            vec![
                ("location".to_string(), "NO081".to_string()),
                ("status".to_string(), "ACTIVE".to_string()),
                ("location".to_string(), "Viken".to_string()),
            ]
        );
    }

    #[test]
    fn test_percent_and_plus_decoding() {
        let pairs = parse_pairs(Some("identifier=Troms%C3%B8&search=cloud+tjenester&flag"));
        assert_eq!(pairs[0].1, "Tromsø");
        assert_eq!(pairs[1].1, "cloud tjenester");
        assert_eq!(pairs[2], ("flag".to_string(), String::new()));
    }

    #[test]
    fn test_encoded_separators_stay_in_values() {
        let pairs = parse_pairs(Some("identifier=Troms%2FRomsa&search=a%26b%3Dc"));
        assert_eq!(pairs[0].1, "Troms/Romsa");
        assert_eq!(pairs[1].1, "a&b=c");
    }

    #[test]
    fn test_empty_query() {
        assert!(parse_pairs(None).is_empty());
        assert!(parse_pairs(Some("")).is_empty());
    }
}
