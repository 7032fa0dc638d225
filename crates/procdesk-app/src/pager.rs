// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub const fn page(&self) -> usize {
        self.page
    }

    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Never zero: an empty table still has one (empty) page.
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    pub fn go_to(&mut self, page: usize, total: usize) -> usize {
        self.page = page.clamp(1, self.page_count(total));
        self.page
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn clamp(&mut self, total: usize) {
        self.page = self.page.clamp(1, self.page_count(total));
    }

    pub fn window(&self, total: usize) -> Range<usize> {
        let start = (self.page - 1).saturating_mul(self.page_size).min(total);
        let end = start.saturating_add(self.page_size).min(total);
        start..end
    }
}
