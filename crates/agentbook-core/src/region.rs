use regex::Regex;
use std::sync::LazyLock;

/// Returned for addresses with no recognizable administrative unit.
pub const UNCLASSIFIED: &str = "기타";

// 구/군 is the most specific unit and takes priority.
static DISTRICT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\S+[구군])").unwrap());

// Otherwise the city following a metropolitan/provincial prefix.
static CITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:특별시|광역시|특별자치시|도)\s+(\S+시)").unwrap());

/// Maps a free-text address to a coarse region label. Total: unclassifiable
/// or empty input yields [`UNCLASSIFIED`].
pub fn classify(address: &str) -> String {
    if address.trim().is_empty() {
        return UNCLASSIFIED.to_string();
    }
    if let Some(caps) = DISTRICT.captures(address) {
        return caps[1].to_string();
    }
    if let Some(caps) = CITY.captures(address) {
        return caps[1].to_string();
    }
    UNCLASSIFIED.to_string()
}
