use crate::config::SiteSettings;
use crate::presentation::views::{
    BrandView, FooterView, LayoutChrome, NavigationLinkView, NavigationView, PageMetaView,
};

const NAVIGATION: [(&str, &str); 2] = [("Blog", "/blog"), ("Tags", "/tags")];

/// Site-wide layout pieces shared by every page. Built once from settings.
#[derive(Clone)]
pub struct ChromeService {
    chrome: LayoutChrome,
}

impl ChromeService {
    pub fn new(site: &SiteSettings) -> Self {
        let entries = NAVIGATION
            .iter()
            .map(|(label, href)| NavigationLinkView {
                label: (*label).to_string(),
                href: (*href).to_string(),
            })
            .collect();

        let chrome = LayoutChrome {
            brand: BrandView {
                title: site.title.clone(),
                href: "/".to_string(),
            },
            navigation: NavigationView { entries },
            footer: FooterView {
                copy: site.title.clone(),
            },
            meta: PageMetaView {
                title: site.title.clone(),
                description: site.description.clone(),
                canonical: site.public_url.clone(),
            },
        };

        Self { chrome }
    }

    pub fn load(&self) -> LayoutChrome {
        self.chrome.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrome_reflects_site_settings() {
        let site = SiteSettings {
            title: "Folio".into(),
            description: "Notes on JavaScript".into(),
            public_url: "https://example.com/".into(),
        };

        let chrome = ChromeService::new(&site).load();

        assert_eq!(chrome.brand.title, "Folio");
        assert_eq!(chrome.meta.description, "Notes on JavaScript");
        let hrefs: Vec<&str> = chrome
            .navigation
            .entries
            .iter()
            .map(|entry| entry.href.as_str())
            .collect();
        assert_eq!(hrefs, ["/blog", "/tags"]);
    }
}
