use serde::Deserialize;
use utoipa::IntoParams;

/// Pagination parameters shared by the list endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

impl Pagination {
    /// Clamp to something the database should actually be asked for.
    pub fn normalized(&self) -> (u64, u64) {
        (self.page.max(1), self.per_page.clamp(1, 100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination { page: 0, per_page: 10_000 };
        assert_eq!(p.normalized(), (1, 100));

        let p = Pagination::default();
        assert_eq!(p.normalized(), (1, 20));
    }
}
