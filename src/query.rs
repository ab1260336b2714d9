use std::collections::BTreeMap;

use url::Url;

/// Search endpoint of the Algolia Hacker News API.
pub const SEARCH_ENDPOINT: &str = "http://hn.algolia.com/api/v1/search";

/// Named query configurations for the story feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Top,
    New,
}

impl Preset {
    /// The `tags` value the search API expects for this feed.
    pub fn tags(&self) -> &'static str {
        match self {
            Preset::Top => "front_page",
            Preset::New => "story",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Preset::Top => "Top",
            Preset::New => "New",
        }
    }
}

/// Query-state builder for the search endpoint.
///
/// The parsed base address is kept separate from the parameter map, so no
/// parameter mutation can ever reach the base. Parameters are held in a
/// `BTreeMap`: keys stay unique (last write wins) and render in a stable
/// alphabetical order.
#[derive(Debug, Clone)]
pub struct SearchUrl {
    base: Url,
    params: BTreeMap<String, String>,
}

impl SearchUrl {
    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?,
            params: BTreeMap::new(),
        })
    }

    /// Drops every query parameter.
    pub fn reset(&mut self) {
        self.params.clear();
    }

    /// Points the query at one of the named feeds. Overwrites any prior
    /// `tags` value, so repeated calls never stack parameters.
    pub fn select(&mut self, preset: Preset) {
        self.set("tags", preset.tags());
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.params.insert(key.to_string(), value.to_string());
    }

    /// The address with the query stripped, computed on a copy of the
    /// underlying URL.
    pub fn base(&self) -> String {
        let mut stripped = self.base.clone();
        stripped.set_query(None);
        stripped.to_string()
    }

    /// The full address. Parameters are percent-encoded; the `?` is
    /// omitted when there are none.
    pub fn render(&self) -> String {
        if self.params.is_empty() {
            return self.base();
        }
        let mut url = self.base.clone();
        url.query_pairs_mut().clear().extend_pairs(self.params.iter());
        url.to_string()
    }
}

impl Default for SearchUrl {
    fn default() -> Self {
        Self::parse(SEARCH_ENDPOINT).expect("default endpoint is a valid URL")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_renders_bare_endpoint() {
        let url = SearchUrl::default();
        assert_eq!(url.render(), SEARCH_ENDPOINT);
    }

    #[test]
    fn base_survives_preset_mutation() {
        let mut url = SearchUrl::default();
        assert_eq!(url.base(), SEARCH_ENDPOINT);

        url.select(Preset::Top);
        url.select(Preset::New);
        assert_eq!(url.base(), SEARCH_ENDPOINT);
    }

    #[test]
    fn reset_clears_query() {
        let mut url = SearchUrl::default();
        url.select(Preset::Top);
        url.reset();
        assert_eq!(url.render(), SEARCH_ENDPOINT);
    }

    #[test]
    fn top_preset_sets_front_page_tag() {
        let mut url = SearchUrl::default();
        url.select(Preset::Top);
        assert_eq!(url.render(), format!("{}?tags=front_page", SEARCH_ENDPOINT));
    }

    #[test]
    fn new_preset_sets_story_tag() {
        let mut url = SearchUrl::default();
        url.select(Preset::New);
        assert_eq!(url.render(), format!("{}?tags=story", SEARCH_ENDPOINT));
    }

    #[test]
    fn selecting_twice_does_not_duplicate_parameters() {
        let mut url = SearchUrl::default();
        url.select(Preset::Top);
        let once = url.render();
        url.select(Preset::Top);
        assert_eq!(url.render(), once);
    }

    #[test]
    fn switching_presets_replaces_the_tag() {
        let mut url = SearchUrl::default();
        url.select(Preset::Top);
        url.select(Preset::New);
        assert_eq!(url.render(), format!("{}?tags=story", SEARCH_ENDPOINT));
    }

    #[test]
    fn parameters_render_in_alphabetical_order() {
        let mut url = SearchUrl::default();
        url.set("query", "rust");
        url.select(Preset::Top);
        url.set("hitsPerPage", "5");
        assert_eq!(
            url.render(),
            format!(
                "{}?hitsPerPage=5&query=rust&tags=front_page",
                SEARCH_ENDPOINT
            )
        );
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        let mut url = SearchUrl::default();
        url.set("query", "a&b=c");
        assert_eq!(url.render(), format!("{}?query=a%26b%3Dc", SEARCH_ENDPOINT));
    }

    #[test]
    fn custom_endpoint_is_accepted() {
        let url = SearchUrl::parse("http://127.0.0.1:8080/search").expect("parse");
        assert_eq!(url.base(), "http://127.0.0.1:8080/search");
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(SearchUrl::parse("not a url").is_err());
    }
}
