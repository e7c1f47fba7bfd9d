//! Core business logic - framework-agnostic operations over the database.
//!
//! Every function takes the connection explicitly and, where a result depends
//! on who is asking, the requesting user's id as a plain parameter.

/// Recipe list filters (author, tags, favorites, cart, ingredient prefix)
pub mod filter;
/// Ingredient lookups and seeding
pub mod ingredient;
/// Recipe CRUD and validation
pub mod recipe;
/// Shopping list aggregation and rendering
pub mod shopping_list;
/// Subscription listings
pub mod subscription;
/// Tag lookups and seeding
pub mod tag;
/// Add/remove state machine for favorites, cart and subscriptions
pub mod toggle;
/// Registration, lookup and token resolution for users
pub mod user;

use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};

/// A 1-based page number and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1
    pub page: u64,
    /// Rows per page
    pub per_page: u64,
}

impl PageRequest {
    /// Page `page` (1-based) of `per_page` rows.
    #[must_use]
    pub const fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Number of rows skipped before this page, or `None` when it does not
    /// fit a SQL `OFFSET` (a signed 64-bit integer).
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        self.page
            .saturating_sub(1)
            .checked_mul(self.per_page.max(1))
            .filter(|offset| i64::try_from(*offset).is_ok())
    }

    /// The error for a page that lies beyond any listing.
    #[must_use]
    pub fn not_found(&self) -> Error {
        Error::NotFound {
            resource: "Page",
            id: i64::try_from(self.page).unwrap_or(i64::MAX),
        }
    }
}

/// Runs `query` for one page and returns the rows along with the total row count.
///
/// # Errors
/// A page whose offset overflows is [`Error::NotFound`]; no query is run for it.
pub async fn fetch_page<'db, C, E>(
    db: &'db C,
    query: Select<E>,
    request: PageRequest,
) -> Result<(Vec<E::Model>, u64)>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync + 'db,
{
    if request.offset().is_none() {
        return Err(request.not_found());
    }

    let paginator = query.paginate(db, request.per_page.max(1));
    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(request.page.saturating_sub(1)).await?;
    Ok((rows, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entities::User, test_utils::*};

    #[test]
    fn test_offset_overflow() {
        assert_eq!(PageRequest::new(1, 6).offset(), Some(0));
        assert_eq!(PageRequest::new(3, 6).offset(), Some(12));
        assert_eq!(PageRequest::new(9_223_372_036_854_775_807, 6).offset(), None);
        assert_eq!(PageRequest::new(2, u64::MAX).offset(), None);
        // fits u64 but not a SQL offset
        assert_eq!(PageRequest::new(2, 1 << 63).offset(), None);
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_huge_page() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "alice").await?;

        let huge = PageRequest::new(u64::MAX, 6);
        let result = fetch_page(&db, User::find(), huge).await;
        assert!(matches!(
            result,
            Err(Error::NotFound { resource: "Page", id: i64::MAX })
        ));

        let (rows, total) = fetch_page(&db, User::find(), PageRequest::new(1, 6)).await?;
        assert_eq!((rows.len(), total), (1, 1));

        Ok(())
    }
}
