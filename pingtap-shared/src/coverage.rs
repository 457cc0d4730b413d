//! Service availability lookup
//!
//! Coverage is decided from the pincode and the Thane locality the customer
//! picks. Only `400xxx` pincodes are served.

use serde::{Deserialize, Serialize};

/// Localities offered in the signup form
pub const SERVICE_AREAS: [&str; 8] = [
    "Kasarvadavali",
    "Ghodbunder Road",
    "Majiwada",
    "Manpada",
    "Wagle Estate",
    "Khopat",
    "Naupada",
    "Other",
];

const UNSERVED_AREAS: [&str; 2] = ["Wagle Estate", "Khopat"];
const LIMITED_AREAS: [&str; 1] = ["Naupada"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    Available,
    Limited,
    Unavailable,
}

/// Looks up coverage for a pincode / area pair
pub fn check_availability(pincode: &str, area: &str) -> Coverage {
    let area = area.trim();

    if !pincode.trim().starts_with("400") {
        Coverage::Unavailable
    } else if UNSERVED_AREAS.contains(&area) {
        Coverage::Unavailable
    } else if LIMITED_AREAS.contains(&area) {
        Coverage::Limited
    } else {
        Coverage::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_thane_unavailable() {
        assert_eq!(check_availability("110001", "Majiwada"), Coverage::Unavailable);
        assert_eq!(check_availability("", "Majiwada"), Coverage::Unavailable);
    }

    #[test]
    fn test_unserved_areas() {
        assert_eq!(check_availability("400604", "Wagle Estate"), Coverage::Unavailable);
        assert_eq!(check_availability("400601", "Khopat"), Coverage::Unavailable);
    }

    #[test]
    fn test_limited_and_available() {
        assert_eq!(check_availability("400602", "Naupada"), Coverage::Limited);
        assert_eq!(check_availability("400615", "Kasarvadavali"), Coverage::Available);
        assert_eq!(check_availability("400615", "Other"), Coverage::Available);
    }

    #[test]
    fn test_area_list() {
        assert_eq!(SERVICE_AREAS.len(), 8);
        assert!(SERVICE_AREAS.contains(&"Ghodbunder Road"));
    }
}
