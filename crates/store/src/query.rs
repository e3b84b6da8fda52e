use common::UserId;

/// Sort order for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Cheapest first.
    PriceLow,
    /// Most expensive first.
    PriceHigh,
}

impl ProductSort {
    /// Parses the `sort` query-string value, falling back to [`ProductSort::Newest`].
    pub fn parse(value: &str) -> Self {
        match value {
            "price_low" => ProductSort::PriceLow,
            "price_high" => ProductSort::PriceHigh,
            _ => ProductSort::Newest,
        }
    }

    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            ProductSort::Newest => "created_at DESC",
            ProductSort::PriceLow => "price ASC",
            ProductSort::PriceHigh => "price DESC",
        }
    }
}

/// Builder for catalog queries.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Case-insensitive substring matched against title and description.
    pub search: Option<String>,

    /// Only products listed by this seller.
    pub seller_id: Option<UserId>,

    pub sort: ProductSort,

    /// Maximum number of products to return.
    pub limit: Option<usize>,
}

impl ProductQuery {
    /// Creates a query returning every product, newest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by a search term. Blank terms are ignored.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let trimmed = term.trim();
        self.search = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Filters by seller.
    pub fn seller(mut self, seller_id: UserId) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    /// Sets the sort order.
    pub fn sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the maximum number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if `title`/`description` match the search term.
    pub(crate) fn matches_text(&self, title: &str, description: Option<&str>) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                title.to_lowercase().contains(&term)
                    || description.is_some_and(|d| d.to_lowercase().contains(&term))
            }
        }
    }
}
