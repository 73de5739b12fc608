// src/utils/pagination.rs
use serde::Serialize;

use crate::errors::{TaxiError, TaxiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(number: u32, per_page: u32) -> Self {
        Self {
            number: number.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn first(per_page: u32) -> Self {
        Self::new(1, per_page)
    }

    /// Parses the raw `page` query value. Missing or blank means the first
    /// page; anything that is not a positive integer is a 404.
    pub fn parse(raw: Option<&str>, per_page: u32) -> TaxiResult<Self> {
        let raw = raw.map(str::trim).unwrap_or("");
        if raw.is_empty() {
            return Ok(Self::first(per_page));
        }
        match raw.parse::<u32>() {
            Ok(number) if number >= 1 => Ok(Self::new(number, per_page)),
            _ => Err(TaxiError::not_found(format!("Invalid page: {}", raw))),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.per_page)
    }

    /// Page 1 always exists, even for an empty result.
    pub fn ensure_within(&self, total: i64) -> TaxiResult<()> {
        let pages = num_pages(total, self.per_page);
        if self.number > pages {
            return Err(TaxiError::not_found(format!(
                "Page {} is out of range (last page is {})",
                self.number, pages
            )));
        }
        Ok(())
    }
}

pub fn num_pages(total: i64, per_page: u32) -> u32 {
    if total <= 0 {
        return 1;
    }
    let per_page = i64::from(per_page.max(1));
    u32::try_from((total + per_page - 1) / per_page).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub total: i64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: u32,
    pub next_page_number: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let pages = num_pages(total, request.per_page);
        Self {
            items,
            number: request.number,
            num_pages: pages,
            total,
            has_previous: request.number > 1,
            has_next: request.number < pages,
            previous_page_number: request.number.saturating_sub(1).max(1),
            next_page_number: (request.number + 1).min(pages),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            has_previous: self.has_previous,
            has_next: self.has_next,
            previous_page_number: self.previous_page_number,
            next_page_number: self.next_page_number,
        }
    }
}
