//! Subscription listings - the authors a user follows.

use crate::{
    core::{PageRequest, fetch_page},
    entities::{Subscription, User, subscription, user},
    errors::Result,
};
use sea_orm::{QueryOrder, prelude::*, sea_query::Query};

/// Lists the authors `user_id` is subscribed to, ordered by id.
pub async fn get_subscribed_authors(
    db: &DatabaseConnection,
    user_id: i64,
    page: PageRequest,
) -> Result<(Vec<user::Model>, u64)> {
    let followed = Query::select()
        .column(subscription::Column::AuthorId)
        .from(Subscription)
        .and_where(subscription::Column::UserId.eq(user_id))
        .to_owned();

    let query = User::find()
        .filter(user::Column::Id.in_subquery(followed))
        .order_by_asc(user::Column::Id);
    fetch_page(db, query, page).await
}
