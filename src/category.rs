//! Maps a search result to one label of the fixed category catalog.

/// Category queries issued by a full fetch, grouped by theme.
pub const CATEGORIES: &[&str] = &[
    // nature and geography
    "beach",
    "island",
    "waterfall",
    "forest",
    "desert",
    "cave",
    "mountain",
    "national park",
    "coastal",
    "astro-tourism",
    "geotourism",
    // culture, history and arts
    "heritage site",
    "fort",
    "temple",
    "church",
    "museum",
    "gallery",
    "tribal village",
    "literary tourism",
    "pilgrimage",
    "art festival",
    // entertainment and lifestyle
    "urban city",
    "nightlife",
    "theme park",
    "gastronomy",
    "wine tour",
    "shopping",
    "gambling",
    "wedding tourism",
    "fashion tourism",
    // health and wellness
    "spa",
    "yoga retreat",
    "wellness center",
    "medical tourism",
    "ecotourism",
    "volunteering",
    "accessible tourism",
    "spiritual retreat",
    // activity
    "adventure sports",
    "water sports",
    "winter sports",
    "cycling",
    "wildlife safari",
    "nautical/cruise",
    // niche
    "dark tourism",
    "atomic tourism",
    "agritourism",
    "industrial tourism",
    "space tourism",
    "disaster tourism",
    "lighthouse tourism",
    // support services
    "restaurant",
    "cafe",
    "hotel",
    "resort",
    "ferry ride",
];

/// Operator keywords that identify activity agencies whose query does not
/// name a catalog category directly.
pub const AGENCY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "water sports",
        &["water sports", "jet ski", "banana boat", "parasailing"],
    ),
    (
        "adventure sports",
        &["rock climbing", "zipline", "rafting", "mountain sports"],
    ),
];

pub const FALLBACK_CATEGORY: &str = "other";

/// Resolves the category for a result of `query`.
///
/// A catalog label contained in the query wins over the keyword table, which
/// wins over the `other` fallback. `types` is accepted for callers that carry
/// provider type tags but does not influence the result.
pub fn map_category(_types: &[String], query: &str) -> String {
    let query = query.to_lowercase();

    if let Some(category) = CATEGORIES
        .iter()
        .find(|category| query.contains(&category.replace('-', " ")))
    {
        return (*category).to_string();
    }

    AGENCY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| query.contains(keyword)))
        .map(|(category, _)| (*category).to_string())
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
}

/// Key used by the enrichment tables: lowercase with spaces and hyphens
/// folded to underscores, so `water sports` looks up `water_sports`.
pub fn table_key(category: &str) -> String {
    category
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}
