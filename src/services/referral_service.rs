use crate::config::{Config, PaginationConfig};
use crate::entities::identity_entity as identities;
use crate::error::AppResult;
use crate::models::*;
use crate::services::ReferralGraph;
use crate::utils::*;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    Condition, DatabaseConnection, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

const RECENT_REFERRALS: u64 = 5;

/// Dashboard queries over an identity's direct referrals.
#[derive(Clone)]
pub struct ReferralService {
    pool: DatabaseConnection,
    graph: ReferralGraph,
    pagination: PaginationConfig,
}

/// `%needle%` with LIKE wildcards in the needle escaped by `\`.
///
/// The column side goes through the database's `LOWER()`, which on SQLite
/// folds ASCII only: there non-ASCII letters match case-sensitively.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn search_condition(search: &str) -> Condition {
    let pattern = like_pattern(search);
    [
        identities::Column::DisplayName,
        identities::Column::LastName,
        identities::Column::Email,
    ]
    .into_iter()
    .fold(Condition::any(), |cond, column| {
        cond.add(
            Expr::expr(Func::lower(Expr::col(column)))
                .like(LikeExpr::new(pattern.clone()).escape('\\')),
        )
    })
}

impl ReferralService {
    pub fn new(pool: DatabaseConnection, config: &Config) -> Self {
        Self {
            graph: ReferralGraph::new(pool.clone()),
            pool,
            pagination: config.pagination,
        }
    }

    pub async fn list_referrals(
        &self,
        uuid: Uuid,
        query: &ReferralListQuery,
    ) -> AppResult<Page<ReferralItem>> {
        let request = PageRequest::parse(
            query.page.as_deref(),
            query.limit.as_deref(),
            &self.pagination,
        )?;
        let sort = ReferralSort::parse(query.sort.as_deref());
        let identity = self.graph.find_by_uuid(uuid).await?;

        let mut select = self.graph.children(identity.id);
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(search_condition(search));
        }

        let total = select.clone().count(&self.pool).await?;

        let column = match sort.field {
            ReferralSortField::CreatedAt => identities::Column::CreatedAt,
            ReferralSortField::DisplayName => identities::Column::DisplayName,
            ReferralSortField::Email => identities::Column::Email,
        };
        let order = if sort.descending { Order::Desc } else { Order::Asc };

        let models = select
            .order_by(column, order.clone())
            .order_by(identities::Column::Id, order)
            .limit(request.limit)
            .offset(request.offset())
            .all(&self.pool)
            .await?;

        Ok(Page::new(models, request, total).map(ReferralItem::from))
    }

    pub async fn analytics(&self, uuid: Uuid) -> AppResult<ReferralAnalytics> {
        self.analytics_at(uuid, Utc::now()).await
    }

    /// Counts are taken relative to `now`: calendar days in UTC for today and
    /// yesterday, rolling windows for 7 and 30 days.
    pub async fn analytics_at(
        &self,
        uuid: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<ReferralAnalytics> {
        let identity = self.graph.find_by_uuid(uuid).await?;
        let windows = ReferralWindows::at(now);

        let total_referrals = self.graph.count_children(identity.id).await?;
        let today = self
            .graph
            .children_since(identity.id, windows.today_start)
            .await?;
        let since_yesterday = self
            .graph
            .children_since(identity.id, windows.yesterday_start)
            .await?;
        let last_7_days = self
            .graph
            .children_since(identity.id, windows.last_7_days)
            .await?;
        let last_30_days = self
            .graph
            .children_since(identity.id, windows.last_30_days)
            .await?;

        let monthly = monthly_breakdown(self.graph.children_created_at(identity.id).await?);
        let recent = self
            .graph
            .children_of(identity.id, Some(RECENT_REFERRALS))
            .await?;

        Ok(ReferralAnalytics {
            referral_stats: ReferralStats {
                total_referrals,
                today,
                yesterday: since_yesterday.saturating_sub(today),
                last_7_days,
                last_30_days,
            },
            monthly_breakdown: monthly,
            recent_referrals: recent.into_iter().map(ReferralItem::from).collect(),
        })
    }
}
