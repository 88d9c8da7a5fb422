//! Draw persistence
//!
//! Replaces a group's match set and marks the group drawn.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionError, TransactionTrait,
};
use std::collections::HashSet;
use tracing::debug;

use super::pairing::{check_assignment, Pairing};
use crate::entity::group::{self, GroupStatus};
use crate::entity::{group_member, santa_match};
use crate::error::DrawError;

/// Member user ids of a group, in join order
pub async fn load_member_ids<C>(db: &C, group_id: i64) -> Result<Vec<i64>, DbErr>
where
    C: ConnectionTrait,
{
    let members = group_member::Entity::find()
        .filter(group_member::Column::GroupId.eq(group_id))
        .order_by_asc(group_member::Column::JoinedAt)
        .order_by_asc(group_member::Column::Id)
        .all(db)
        .await?;

    Ok(members.into_iter().map(|m| m.user_id).collect())
}

/// Current match set of a group
pub async fn load_matches(
    db: &DatabaseConnection,
    group_id: i64,
) -> Result<Vec<santa_match::Model>, DbErr> {
    santa_match::Entity::find()
        .filter(santa_match::Column::GroupId.eq(group_id))
        .order_by_asc(santa_match::Column::Id)
        .all(db)
        .await
}

/// Replace the match set of `group_id` with `assignment`.
///
/// Order inside the transaction: delete old matches, insert new ones with
/// `is_revealed = false`, then set the status to drawn. The status write is
/// last so a drawn group is never observed without its matches.
///
/// The assignment must cover exactly the group's current members, checked
/// inside the transaction. Callers hold the group's draw lock; outside this
/// module that means going through [`DrawService`](super::DrawService).
pub(crate) async fn apply_draw(
    db: &DatabaseConnection,
    group_id: i64,
    assignment: &[Pairing<i64>],
) -> Result<(), DrawError> {
    check_assignment(assignment)?;

    let now = chrono::Utc::now().timestamp();
    let rows: Vec<santa_match::ActiveModel> = assignment
        .iter()
        .map(|pair| santa_match::ActiveModel {
            group_id: Set(group_id),
            santa_user_id: Set(pair.santa),
            recipient_user_id: Set(pair.recipient),
            is_revealed: Set(false),
            created_at: Set(now),
            ..Default::default()
        })
        .collect();
    let count = rows.len();
    let santa_ids: Vec<i64> = assignment.iter().map(|pair| pair.santa).collect();

    db.transaction::<_, (), DrawError>(|txn| {
        Box::pin(async move {
            if group::Entity::find_by_id(group_id).one(txn).await?.is_none() {
                return Err(DrawError::GroupNotFound(group_id));
            }

            let members: HashSet<i64> = load_member_ids(txn, group_id).await?.into_iter().collect();
            let santas: HashSet<i64> = santa_ids.into_iter().collect();
            if santas != members {
                return Err(DrawError::InvalidAssignment(
                    "assignment does not match the current members".to_string(),
                ));
            }

            let removed = santa_match::Entity::delete_many()
                .filter(santa_match::Column::GroupId.eq(group_id))
                .exec(txn)
                .await?;

            santa_match::Entity::insert_many(rows).exec(txn).await?;

            group::Entity::update_many()
                .col_expr(group::Column::Status, Expr::value(GroupStatus::Drawn.as_str()))
                .filter(group::Column::Id.eq(group_id))
                .exec(txn)
                .await?;

            debug!(
                "Group {}: replaced {} matches with {}",
                group_id, removed.rows_affected, count
            );
            Ok(())
        })
    })
    .await
    .map_err(|e| match e {
        TransactionError::Connection(db_err) => DrawError::Storage(db_err),
        TransactionError::Transaction(draw_err) => draw_err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn cycle(ids: &[i64]) -> Vec<Pairing<i64>> {
        (0..ids.len())
            .map(|k| Pairing {
                santa: ids[k],
                recipient: ids[(k + 1) % ids.len()],
            })
            .collect()
    }

    fn as_pairs(matches: &[santa_match::Model]) -> Vec<Pairing<i64>> {
        let mut pairs: Vec<Pairing<i64>> = matches
            .iter()
            .map(|m| Pairing {
                santa: m.santa_user_id,
                recipient: m.recipient_user_id,
            })
            .collect();
        pairs.sort_by_key(|p| p.santa);
        pairs
    }

    #[tokio::test]
    async fn test_first_draw_sets_status_and_matches() {
        let db = testing::test_db().await;
        let fixture = testing::group_with_members(&db, 3).await;

        let group_before = testing::reload_group(&db, fixture.group.id).await;
        assert_eq!(group_before.status(), GroupStatus::Planning);
        assert!(load_matches(&db, fixture.group.id).await.unwrap().is_empty());

        apply_draw(&db, fixture.group.id, &cycle(&fixture.member_ids)).await.unwrap();

        let group_after = testing::reload_group(&db, fixture.group.id).await;
        assert_eq!(group_after.status(), GroupStatus::Drawn);

        let matches = load_matches(&db, fixture.group.id).await.unwrap();
        assert_eq!(matches.len(), 3);
        assert!(matches.iter().all(|m| !m.is_revealed));
        assert!(matches.iter().all(|m| m.group_id == fixture.group.id));
    }

    #[tokio::test]
    async fn test_redraw_replaces_previous_matches() {
        let db = testing::test_db().await;
        let fixture = testing::group_with_members(&db, 4).await;
        let ids = &fixture.member_ids;

        let first = cycle(ids);
        apply_draw(&db, fixture.group.id, &first).await.unwrap();

        let reversed: Vec<i64> = ids.iter().rev().copied().collect();
        let second = cycle(&reversed);
        apply_draw(&db, fixture.group.id, &second).await.unwrap();

        let matches = load_matches(&db, fixture.group.id).await.unwrap();
        assert_eq!(matches.len(), 4);

        let mut expected = second.clone();
        expected.sort_by_key(|p| p.santa);
        assert_eq!(as_pairs(&matches), expected);
        assert_eq!(
            testing::reload_group(&db, fixture.group.id).await.status(),
            GroupStatus::Drawn
        );
    }

    #[tokio::test]
    async fn test_other_groups_untouched() {
        let db = testing::test_db().await;
        let a = testing::group_with_members(&db, 3).await;
        let b = testing::group_with_members(&db, 2).await;

        apply_draw(&db, a.group.id, &cycle(&a.member_ids)).await.unwrap();
        apply_draw(&db, b.group.id, &cycle(&b.member_ids)).await.unwrap();
        apply_draw(&db, a.group.id, &cycle(&a.member_ids)).await.unwrap();

        assert_eq!(load_matches(&db, a.group.id).await.unwrap().len(), 3);
        assert_eq!(load_matches(&db, b.group.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_group_writes_nothing() {
        let db = testing::test_db().await;

        let result = apply_draw(&db, 404, &cycle(&[1, 2])).await;
        assert!(matches!(result, Err(DrawError::GroupNotFound(404))));
        assert!(load_matches(&db, 404).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_assignment_rejected_before_writing() {
        let db = testing::test_db().await;
        let fixture = testing::group_with_members(&db, 2).await;

        let bad = vec![Pairing {
            santa: fixture.member_ids[0],
            recipient: fixture.member_ids[1],
        }];
        let result = apply_draw(&db, fixture.group.id, &bad).await;
        assert!(matches!(result, Err(DrawError::InsufficientMembers { found: 1 })));

        let group = testing::reload_group(&db, fixture.group.id).await;
        assert_eq!(group.status(), GroupStatus::Planning);
    }

    #[tokio::test]
    async fn test_member_joining_mid_draw_rejects_stale_assignment() {
        let db = testing::test_db().await;
        let fixture = testing::group_with_members(&db, 3).await;

        let ids = load_member_ids(&db, fixture.group.id).await.unwrap();
        let late = testing::create_user(&db, "Late").await;
        testing::add_member(&db, fixture.group.id, late.id, 100).await;

        let result = apply_draw(&db, fixture.group.id, &cycle(&ids)).await;
        assert!(matches!(result, Err(DrawError::InvalidAssignment(_))));

        let group = testing::reload_group(&db, fixture.group.id).await;
        assert_eq!(group.status(), GroupStatus::Planning);
        assert!(load_matches(&db, fixture.group.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_member_ids_rejected() {
        let db = testing::test_db().await;
        let fixture = testing::group_with_members(&db, 2).await;
        let outsider = testing::create_user(&db, "Outsider").await;

        let ids = [fixture.member_ids[0], fixture.member_ids[1], outsider.id];
        let result = apply_draw(&db, fixture.group.id, &cycle(&ids)).await;
        assert!(matches!(result, Err(DrawError::InvalidAssignment(_))));

        let swapped = [fixture.member_ids[0], outsider.id];
        let result = apply_draw(&db, fixture.group.id, &cycle(&swapped)).await;
        assert!(matches!(result, Err(DrawError::InvalidAssignment(_))));
        assert!(load_matches(&db, fixture.group.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redraw_keeps_existing_matches_when_rejected() {
        let db = testing::test_db().await;
        let fixture = testing::group_with_members(&db, 3).await;
        apply_draw(&db, fixture.group.id, &cycle(&fixture.member_ids)).await.unwrap();

        let outsider = testing::create_user(&db, "Outsider").await;
        let ids = [fixture.member_ids[0], fixture.member_ids[1], outsider.id];
        assert!(apply_draw(&db, fixture.group.id, &cycle(&ids)).await.is_err());

        let matches = load_matches(&db, fixture.group.id).await.unwrap();
        assert_eq!(matches.len(), 3);
        check_assignment(&as_pairs(&matches)).unwrap();
    }

    #[tokio::test]
    async fn test_member_ids_in_join_order() {
        let db = testing::test_db().await;
        let fixture = testing::group_with_members(&db, 5).await;

        let ids = load_member_ids(&db, fixture.group.id).await.unwrap();
        assert_eq!(ids, fixture.member_ids);
    }
}
