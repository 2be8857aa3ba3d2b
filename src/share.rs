use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://sass-lang.com/playground";

/// The desktop stand-in for the browser address bar: a base URL plus the
/// fragment the codec keeps current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLocation {
    base: Url,
    fragment: Option<String>,
}

impl ShareLocation {
    pub fn new(base: Url) -> Self {
        let mut base = base;
        base.set_fragment(None);
        Self { base, fragment: None }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Swaps the fragment in place, like `history.replaceState`.
    pub fn replace_fragment(&mut self, fragment: String) {
        self.fragment = Some(fragment);
    }

    pub fn href(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("{}#{}", self.base, fragment),
            None => self.base.to_string(),
        }
    }
}

impl Default for ShareLocation {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_BASE_URL).expect("default base url"))
    }
}

/// Extracts the fragment from whatever the user pasted: a full link, a bare
/// `#fragment`, or the fragment itself.
pub fn fragment_of(link: &str) -> &str {
    let link = link.trim();
    if let Some(fragment) = link.strip_prefix('#') {
        return fragment;
    }
    if Url::parse(link).is_ok() {
        return link.split_once('#').map(|(_, fragment)| fragment).unwrap_or("");
    }
    link
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_appends_fragment_verbatim() {
        let mut location = ShareLocation::default();
        assert_eq!(location.href(), DEFAULT_BASE_URL);
        location.replace_fragment("eJwz+/=?s=L1C1-L1C3".into());
        assert_eq!(location.href(), format!("{DEFAULT_BASE_URL}#eJwz+/=?s=L1C1-L1C3"));
    }

    #[test]
    fn base_fragment_is_discarded() {
        let base = Url::parse("http://localhost:8080/playground#stale").expect("url");
        assert_eq!(ShareLocation::new(base).href(), "http://localhost:8080/playground");
    }

    #[test]
    fn fragment_of_accepts_links_and_raw_fragments() {
        assert_eq!(fragment_of("https://sass-lang.com/playground#abc?s=L1C1-L1C2"), "abc?s=L1C1-L1C2");
        assert_eq!(fragment_of("https://sass-lang.com/playground"), "");
        assert_eq!(fragment_of("  #abc "), "abc");
        assert_eq!(fragment_of("abc=="), "abc==");
    }
}
