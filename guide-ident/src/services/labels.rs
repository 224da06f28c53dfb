//! On-device class labels and display-name translation
//!
//! The on-device model emits one score per entry in [`LABELS`], in index
//! order. Display names are what the landmark directory stores in its
//! `name` field, so translation happens before directory lookup.

/// Class labels in model output order
pub const LABELS: [&str; 5] = [
    "monument_alexanderthird",
    "monument_to_the_first traffic_light",
    "novat",
    "old_house",
    "theater_globus",
];

/// Translate a classifier label to the directory display name.
///
/// Unknown labels pass through unchanged so that server-side names
/// (which are already display names) still match.
pub fn display_name(label: &str) -> &str {
    match label {
        "novat" => "НОВАТ",
        "old_house" => "Театр «Старый дом»",
        "theater_globus" => "Театр «Глобус»",
        "monument_alexanderthird" => "Памятник императору Александру III",
        "monument_to_the_first traffic_light" => "Памятник первому светофору",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels_translate() {
        assert_eq!(display_name("novat"), "НОВАТ");
        assert_eq!(display_name("theater_globus"), "Театр «Глобус»");
    }

    #[test]
    fn unknown_labels_pass_through() {
        assert_eq!(display_name("НОВАТ"), "НОВАТ");
        assert_eq!(display_name("opera_house"), "opera_house");
    }

    #[test]
    fn every_model_label_has_a_display_name() {
        for label in LABELS {
            assert_ne!(display_name(label), label);
        }
    }
}
