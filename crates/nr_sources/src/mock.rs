use async_trait::async_trait;
use lazy_static::lazy_static;
use nr_core::dates::parse_display_date;
use nr_core::{Article, ArticlePage, ArticleSource, LatestRequest, Result, SearchRequest};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub const ALL: &str = "all";

fn mock(id: &str, source: &str, time: &str, title: &str, lead: &str, photo: &str, category: &[&str]) -> Article {
    Article {
        id: id.to_string(),
        source: source.to_string(),
        published_at_display: time.to_string(),
        title: title.to_string(),
        lead: lead.to_string(),
        body: vec![],
        image: Some(format!("https://images.unsplash.com/photo-{}?w=800&q=80", photo)),
        category: Some(category.iter().map(|c| c.to_string()).collect()),
        likes_count: 0,
        comments_count: 0,
        link: None,
        sentiment: None,
        source_url: None,
    }
}

lazy_static! {
    static ref MOCK_NEWS: BTreeMap<&'static str, Vec<Article>> = {
        let mut data = BTreeMap::new();
        data.insert(ALL, vec![
            mock("mock-1", "Reuters", "2h ago",
                "Global Markets Rally on Positive Economic Data",
                "Investors respond positively to new reports showing stronger-than-expected growth in key sectors, signaling a potential economic recovery.",
                "1611974789855-9c2a0a7236a3", &["business", "world"]),
            mock("mock-2", "Associated Press", "4h ago",
                "New Breakthrough in AI Could Revolutionize Medical Diagnostics",
                "Researchers have developed an AI model that can detect diseases with unprecedented accuracy, promising to speed up patient diagnosis and treatment.",
                "1576091160399-112ba8d25d1d", &["technology"]),
            mock("mock-3", "The Guardian", "5h ago",
                "International Summit Addresses Climate Change Goals",
                "Leaders from around the globe convene to discuss new strategies and commitments for combating climate change, with a focus on renewable energy.",
                "1569163139394-de4798aa62b6", &["world", "environment"]),
        ]);
        data.insert("technology", vec![
            mock("mock-tech-1", "TechCrunch", "1h ago",
                "Major Tech Company Announces Revolutionary Quantum Computing Chip",
                "The new chip promises to solve complex problems exponentially faster than traditional computers, marking a significant milestone in quantum computing.",
                "1518770660439-4636190af475", &["technology"]),
            mock("mock-tech-2", "Wired", "3h ago",
                "5G Networks Expand to Rural Areas, Bridging Digital Divide",
                "Telecommunications companies roll out 5G infrastructure to underserved communities, promising faster internet access and new economic opportunities.",
                "1451187580459-43490279c0fa", &["technology"]),
            mock("mock-tech-3", "The Verge", "6h ago",
                "Cybersecurity Experts Warn of New Ransomware Threat",
                "Security researchers identify sophisticated malware targeting critical infrastructure, urging organizations to update their defense systems immediately.",
                "1550751827-4bd374c3f58b", &["technology"]),
        ]);
        data.insert("politics", vec![
            mock("mock-pol-1", "Politico", "2h ago",
                "Senate Passes Landmark Infrastructure Bill",
                "After months of negotiations, lawmakers approve comprehensive infrastructure package aimed at modernizing transportation and broadband networks.",
                "1529107386315-e1a2ed48a620", &["politics"]),
            mock("mock-pol-2", "The Hill", "4h ago",
                "New Poll Shows Shifting Public Opinion on Key Policy Issues",
                "Recent survey reveals changing attitudes among voters on healthcare, education, and economic policies ahead of upcoming elections.",
                "1541872703-74c5e44368f9", &["politics"]),
            mock("mock-pol-3", "BBC News", "7h ago",
                "International Trade Agreement Reaches Final Stage",
                "Negotiators from multiple countries finalize terms of historic trade deal expected to boost economic cooperation and reduce tariffs.",
                "1526304640581-d334cdbbf45e", &["politics", "world"]),
        ]);
        data.insert("world", vec![
            mock("mock-world-1", "Al Jazeera", "1h ago",
                "Humanitarian Crisis Deepens in Conflict-Affected Region",
                "International aid organizations call for urgent assistance as millions face food insecurity and displacement due to ongoing violence.",
                "1488521787991-ed7bbaae773c", &["world"]),
            mock("mock-world-2", "France 24", "5h ago",
                "European Union Announces New Environmental Regulations",
                "EU member states agree on stricter emissions standards and renewable energy targets to combat climate change and reduce carbon footprint.",
                "1473496169904-658ba7c44d8a", &["world", "environment"]),
            mock("mock-world-3", "Reuters", "8h ago",
                "Historic Peace Agreement Signed Between Neighboring Nations",
                "After decades of tension, two countries formalize diplomatic relations and commit to cooperation on security and economic development.",
                "1451187580459-43490279c0fa", &["world", "politics"]),
        ]);
        data.insert("business", vec![
            mock("mock-biz-1", "Bloomberg", "2h ago",
                "Stock Market Hits Record High Amid Strong Corporate Earnings",
                "Major indices surge as companies report better-than-expected quarterly results, boosting investor confidence in economic recovery.",
                "1590283603385-17ffb3a7f29f", &["business"]),
            mock("mock-biz-2", "Financial Times", "4h ago",
                "Central Bank Announces Interest Rate Decision",
                "Monetary policy committee maintains current rates while signaling potential adjustments based on inflation trends and employment data.",
                "1579621970563-ebec7560ff3e", &["business"]),
            mock("mock-biz-3", "CNBC", "6h ago",
                "Major Merger Announced in Tech Industry",
                "Two leading technology companies agree to combine operations in deal valued at billions, creating industry giant with expanded market reach.",
                "1460925895917-afdab827c52f", &["business", "technology"]),
        ]);
        data
    };
}

/// Serves the fixed dataset, sleeping before each answer so loading states
/// look the same as against the live API.
#[derive(Debug, Clone)]
pub struct MockNewsSource {
    latency: Duration,
}

impl Default for MockNewsSource {
    fn default() -> Self {
        Self::new(nr_core::config::DEFAULT_MOCK_LATENCY)
    }
}

impl MockNewsSource {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn categories() -> Vec<&'static str> {
        MOCK_NEWS.keys().copied().filter(|k| *k != ALL).collect()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn dataset(category: Option<&str>) -> Vec<Article> {
        let key = category.map(str::to_lowercase).unwrap_or_else(|| ALL.to_string());
        MOCK_NEWS
            .get(key.as_str())
            .or_else(|| MOCK_NEWS.get(ALL))
            .cloned()
            .unwrap_or_default()
    }

    fn everything() -> impl Iterator<Item = &'static Article> {
        MOCK_NEWS.values().flatten()
    }
}

#[async_trait]
impl ArticleSource for MockNewsSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_latest_page(&self, request: &LatestRequest) -> Result<ArticlePage> {
        self.simulate_latency().await;
        let articles = Self::dataset(request.category.as_deref());
        debug!("🧪 mock latest {:?}: {} articles", request.category, articles.len());
        Ok(ArticlePage { total_results: articles.len() as u64, articles, next_page: None })
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Article>> {
        self.simulate_latency().await;
        let needle = request.text.to_lowercase();
        let from = request.date_from.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|d| d.and_utc());
        let to = request.date_to.and_then(|d| d.and_hms_opt(23, 59, 59)).map(|d| d.and_utc());

        Ok(Self::everything()
            .filter(|a| a.title.to_lowercase().contains(&needle) || a.lead.to_lowercase().contains(&needle))
            .filter(|a| request.category.as_deref().map_or(true, |c| a.in_category(c)))
            .filter(|a| match parse_display_date(&a.published_at_display) {
                Some(date) => from.map_or(true, |f| date >= f) && to.map_or(true, |t| date <= t),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Article>> {
        self.simulate_latency().await;
        Ok(Self::everything().find(|a| a.id == id).cloned())
    }
}
