use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub administrator: bool, // stored as '0' / '1'
}

/// One row of the user maintenance listing.
#[derive(Debug, Serialize, Clone)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub administrator: bool,
    pub post_count: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct BlogPost {
    pub id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub title: String,
    pub text: String,
    pub summary: String,
    pub featured_image: Option<String>,
}

pub struct NewBlogPost<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub text: &'a str,
    pub summary: &'a str,
    pub featured_image: Option<&'a str>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub message: String,
    pub r#type: String, // 'success' or 'error'
}

/// A single page of an ordered result set plus the numbers templates need
/// to draw the pager.
#[derive(Debug, Serialize)]
pub struct Pagination<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_num: Option<u32>,
    pub next_num: Option<u32>,
    /// Page numbers to link, `None` marks a gap.
    pub page_numbers: Vec<Option<u32>>,
}

impl<T> Pagination<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(u64::from(per_page)) as u32
        };
        let has_prev = page > 1;
        let has_next = page < pages;
        Pagination {
            items,
            page,
            per_page,
            total,
            pages,
            has_prev,
            has_next,
            prev_num: has_prev.then(|| page - 1),
            next_num: has_next.then(|| page + 1),
            page_numbers: page_window(page, pages, 2, 2, 4, 2),
        }
    }
}

// Keeps the first `left_edge` and last `right_edge` pages plus a window
// around the current one; collapsed runs become a single `None`.
fn page_window(
    page: u32,
    pages: u32,
    left_edge: u32,
    left_current: u32,
    right_current: u32,
    right_edge: u32,
) -> Vec<Option<u32>> {
    let mut numbers = Vec::new();
    let mut last = 0;
    for num in 1..=pages {
        let in_window = num <= left_edge
            || (num + left_current >= page && num <= page + right_current)
            || num + right_edge > pages;
        if in_window {
            if last + 1 != num {
                numbers.push(None);
            }
            numbers.push(Some(num));
            last = num;
        }
    }
    numbers
}

pub mod db_operations;
pub mod forms;
