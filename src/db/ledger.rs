//! Balance primitives shared by every settlement path.
//!
//! All functions take a generic connection so they run inside the caller's
//! transaction. Balances are only ever changed with single-statement
//! `UPDATE ... SET col = col + n` expressions, never read-modify-write.

use sea_orm::{ sea_query::Expr, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, SqlErr };

use crate::db::entity::user;
use crate::error::Result;

/// The two balances a user can earn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceBucket {
    Task,
    Referral,
}

impl BalanceBucket {
    fn column(self) -> user::Column {
        match self {
            BalanceBucket::Task => user::Column::BalanceTaskCents,
            BalanceBucket::Referral => user::Column::BalanceReferralCents,
        }
    }
}

/// True when the error is a unique index rejecting an insert.
pub fn is_duplicate_key(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Atomically add `cents` to one balance. Returns false if the user does not exist.
pub async fn credit<C>(conn: &C, user_id: i32, bucket: BalanceBucket, cents: i64) -> Result<bool>
    where C: ConnectionTrait
{
    let column = bucket.column();
    let result = user::Entity
        ::update_many()
        .col_expr(column, Expr::col(column).add(cents))
        .filter(user::Column::Id.eq(user_id))
        .exec(conn).await?;

    Ok(result.rows_affected == 1)
}

/// Atomically subtract from both balances, but only if neither would go
/// negative. Returns false when the guard fails or the user is missing.
pub async fn debit<C>(conn: &C, user_id: i32, from_task: i64, from_referral: i64) -> Result<bool>
    where C: ConnectionTrait
{
    let result = user::Entity
        ::update_many()
        .col_expr(
            user::Column::BalanceTaskCents,
            Expr::col(user::Column::BalanceTaskCents).sub(from_task)
        )
        .col_expr(
            user::Column::BalanceReferralCents,
            Expr::col(user::Column::BalanceReferralCents).sub(from_referral)
        )
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::BalanceTaskCents.gte(from_task))
        .filter(user::Column::BalanceReferralCents.gte(from_referral))
        .exec(conn).await?;

    Ok(result.rows_affected == 1)
}

/// Split a withdrawal across the buckets, task balance first.
///
/// Returns `(from_task, from_referral)`, or `None` if the total is too small.
pub fn split_debit(amount: i64, balance_task: i64, balance_referral: i64) -> Option<(i64, i64)> {
    if amount <= 0 || amount > balance_task.max(0) + balance_referral.max(0) {
        return None;
    }

    let from_task = amount.min(balance_task.max(0));
    Some((from_task, amount - from_task))
}
