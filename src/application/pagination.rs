//! Page-number pagination for post feeds.
//!
//! Follows the forgiving "get page" contract: a missing or malformed page
//! number resolves to the first page, and a number outside `1..=num_pages`
//! resolves to the last page. An empty result set still has one empty page.

/// Posts shown per feed page.
pub const POSTS_PER_PAGE: u64 = 10;

/// A page number as requested through the `page` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    requested: Option<i64>,
}

impl PageRequest {
    pub fn first() -> Self {
        Self::default()
    }

    pub fn number(number: i64) -> Self {
        Self {
            requested: Some(number),
        }
    }

    /// Interpret a raw query value; anything that is not an integer means "first page".
    pub fn parse(raw: Option<&str>) -> Self {
        Self {
            requested: raw.and_then(|value| value.trim().parse::<i64>().ok()),
        }
    }
}

/// The slice of a result set selected for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u64) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn window(&self, request: PageRequest) -> PageWindow {
        let num_pages = self.num_pages();
        let number = match request.requested {
            None => 1,
            Some(value) if value >= 1 && (value as u64) <= num_pages => value as u64,
            Some(_) => num_pages,
        };

        PageWindow {
            number,
            num_pages,
            total: self.total,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

/// One page of results together with its position in the whole set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(window: PageWindow, items: Vec<T>) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}
