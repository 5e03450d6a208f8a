use yonca_core::Region;

/// City name fragments, checked first.
const CITY_PATTERNS: &[(&[&str], Region)] = &[
    (&["ganja", "gəncə", "gazakh"], Region::GanjaGazakh),
    (&["lankaran", "lənkəran", "astara"], Region::Lankaran),
    (
        &["sheki", "şəki", "zagatala", "zaqatala", "balakan", "qax"],
        Region::ShekiZagatala,
    ),
    (&["quba", "qusar", "xinaliq", "qabala"], Region::Mountainous),
];

/// Administrative region fragments, checked when no city matches.
const REGION_PATTERNS: &[(&[&str], Region)] = &[
    (&["ganja", "gəncə", "gazakh"], Region::GanjaGazakh),
    (&["lankaran", "lənkəran"], Region::Lankaran),
    (&["sheki", "şəki", "zagatala"], Region::ShekiZagatala),
    (&["quba", "mountain"], Region::Mountainous),
];

fn lookup(name: &str, patterns: &[(&[&str], Region)]) -> Option<Region> {
    let name = name.to_lowercase();
    patterns
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| name.contains(f)))
        .map(|(_, region)| *region)
}

/// Map a geolocated city (and optional admin region) to an agricultural region.
///
/// Anything unrecognised, Bakı included, is Aran.
pub fn map_location_to_region(city: &str, region: Option<&str>) -> Region {
    lookup(city, CITY_PATTERNS)
        .or_else(|| region.and_then(|r| lookup(r, REGION_PATTERNS)))
        .unwrap_or(Region::Aran)
}
