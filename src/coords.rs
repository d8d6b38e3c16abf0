//! Batch credential parsing.
//!
//! A batch string lists endpoints together with the credentials to
//! authenticate against them, e.g.
//! `user1^pass1>https://api1.com;user2^pass2>https://api2.com`.
//! All three separators are literal substrings and may be longer than one
//! character.

use crate::error::{PlexError, Result};
use serde::{Deserialize, Serialize};

/// Default separator between coordinate records.
pub const DEFAULT_TRIPLE_SEPARATOR: &str = ";";

/// Default separator between credentials and endpoint.
pub const DEFAULT_CREDS_ENDPOINT_SEPARATOR: &str = ">";

/// Default separator between username and password.
pub const DEFAULT_USER_PASS_SEPARATOR: &str = "^";

/// The three separators of the batch grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Separators {
    pub triple: String,
    pub creds_endpoint: String,
    pub user_pass: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            triple: DEFAULT_TRIPLE_SEPARATOR.to_string(),
            creds_endpoint: DEFAULT_CREDS_ENDPOINT_SEPARATOR.to_string(),
            user_pass: DEFAULT_USER_PASS_SEPARATOR.to_string(),
        }
    }
}

/// One decoded `{username, password, endpoint}` record.
#[derive(Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub username: String,
    pub password: String,
    pub endpoint: String,
}

// Keeps passwords out of debug output and panic messages.
impl std::fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinate")
            .field("username", &self.username)
            .field("password", &"[expunged]")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Decode every segment of a batch string, in order.
///
/// The first invalid segment aborts the whole parse.
pub fn parse_coordinates(batch: &str, separators: &Separators) -> Result<Vec<Coordinate>> {
    batch
        .split(separators.triple.as_str())
        .map(|segment| parse_coordinate(segment, separators))
        .collect()
}

/// Decode a single `username<up>password<ce>endpoint` segment.
pub fn parse_coordinate(segment: &str, separators: &Separators) -> Result<Coordinate> {
    let invalid = || PlexError::InvalidCoordinateFormat(segment.to_string());

    if segment.matches(separators.creds_endpoint.as_str()).count() != 1
        || segment.matches(separators.user_pass.as_str()).count() != 1
    {
        return Err(invalid());
    }

    let (creds, endpoint) = segment
        .split_once(separators.creds_endpoint.as_str())
        .ok_or_else(invalid)?;
    // The user/pass separator may sit in the endpoint part, leaving none in the credentials.
    let (username, password) = creds
        .split_once(separators.user_pass.as_str())
        .ok_or_else(invalid)?;

    Ok(Coordinate {
        username: username.to_string(),
        password: password.to_string(),
        endpoint: endpoint.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(username: &str, password: &str, endpoint: &str) -> Coordinate {
        Coordinate {
            username: username.to_string(),
            password: password.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    #[test]
    fn decodes_a_single_coordinate() {
        let coords = parse_coordinates("u^p>https://x.com", &Separators::default()).unwrap();
        assert_eq!(coords, vec![coord("u", "p", "https://x.com")]);
    }

    #[test]
    fn decodes_many_coordinates_in_order() {
        let coords = parse_coordinates(
            "user1^pass1>api1.com;user2^pass2>api2.com;user3^pass3>api3.com",
            &Separators::default(),
        )
        .unwrap();

        assert_eq!(
            coords,
            vec![
                coord("user1", "pass1", "api1.com"),
                coord("user2", "pass2", "api2.com"),
                coord("user3", "pass3", "api3.com"),
            ]
        );
    }

    #[test]
    fn missing_endpoint_separator_is_invalid() {
        let err = parse_coordinate("username^password", &Separators::default()).unwrap_err();
        assert!(matches!(err, PlexError::InvalidCoordinateFormat(ref s) if s == "username^password"));
        assert_eq!(err.to_string(), "username^password is invalid");
    }

    #[test]
    fn missing_user_pass_separator_is_invalid() {
        let err = parse_coordinate("username>api.com", &Separators::default()).unwrap_err();
        assert_eq!(err.to_string(), "username>api.com is invalid");
    }

    #[test]
    fn repeated_separator_is_invalid() {
        let err = parse_coordinate("u^p^q>api.com", &Separators::default()).unwrap_err();
        assert_eq!(err.to_string(), "u^p^q>api.com is invalid");

        let err = parse_coordinate("u^p>api.com>more", &Separators::default()).unwrap_err();
        assert_eq!(err.to_string(), "u^p>api.com>more is invalid");
    }

    #[test]
    fn user_pass_separator_in_endpoint_is_invalid() {
        let err = parse_coordinate("user>api^x.com", &Separators::default()).unwrap_err();
        assert!(matches!(err, PlexError::InvalidCoordinateFormat(_)));
    }

    #[test]
    fn first_invalid_segment_aborts_whole_parse() {
        let err = parse_coordinates("username^password>api.com;user^pass", &Separators::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "user^pass is invalid");
    }

    #[test]
    fn empty_segments_are_kept_and_rejected() {
        let err = parse_coordinates("u^p>api.com;", &Separators::default()).unwrap_err();
        assert!(matches!(err, PlexError::InvalidCoordinateFormat(ref s) if s.is_empty()));

        let err = parse_coordinates("", &Separators::default()).unwrap_err();
        assert!(matches!(err, PlexError::InvalidCoordinateFormat(ref s) if s.is_empty()));
    }

    #[test]
    fn allows_multi_char_separators() {
        let separators = Separators {
            triple: "|".to_string(),
            creds_endpoint: "_".to_string(),
            user_pass: "-foo-".to_string(),
        };
        let coords = parse_coordinates(
            "user1-foo-pass1_https://api1.com|user2-foo-pass2_https://api2.com",
            &separators,
        )
        .unwrap();

        assert_eq!(
            coords,
            vec![
                coord("user1", "pass1", "https://api1.com"),
                coord("user2", "pass2", "https://api2.com"),
            ]
        );
    }

    #[test]
    fn single_char_of_multi_char_separator_is_not_a_match() {
        let separators = Separators {
            triple: "||".to_string(),
            creds_endpoint: "=>".to_string(),
            user_pass: "::".to_string(),
        };
        let coords = parse_coordinates("a:b::c=>https://x.com|y", &separators).unwrap();
        assert_eq!(coords, vec![coord("a:b", "c", "https://x.com|y")]);
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", coord("u", "hunter2", "https://x.com"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("https://x.com"));
    }
}
