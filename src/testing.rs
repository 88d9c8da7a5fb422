//! Test fixtures: in-memory sqlite database and seeded groups

use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, Set};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::db;
use crate::entity::group::{self, GroupStatus};
use crate::entity::{group_member, user};

static NEXT_USER: AtomicU64 = AtomicU64::new(1);

/// Fresh in-memory database with all tables created
pub async fn test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    db::auto_migrate(&db).await.unwrap();
    db
}

pub async fn create_user(db: &DatabaseConnection, full_name: &str) -> user::Model {
    let n = NEXT_USER.fetch_add(1, Ordering::Relaxed);
    user::ActiveModel {
        email: Set(format!("user{}@example.com", n)),
        full_name: Set(full_name.to_string()),
        password: Set("not-a-real-hash".to_string()),
        avatar_url: Set(None),
        created_at: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn add_member(
    db: &DatabaseConnection,
    group_id: i64,
    user_id: i64,
    joined_at: i64,
) -> group_member::Model {
    group_member::ActiveModel {
        group_id: Set(group_id),
        user_id: Set(user_id),
        wishlist: Set(None),
        joined_at: Set(joined_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub struct GroupFixture {
    pub group: group::Model,
    /// Member user ids in join order; the first one is the admin
    pub member_ids: Vec<i64>,
}

impl GroupFixture {
    pub fn admin_id(&self) -> i64 {
        self.group.admin_user_id
    }
}

/// A planning group whose admin is the first of `size` members
pub async fn group_with_members(db: &DatabaseConnection, size: usize) -> GroupFixture {
    let admin = create_user(db, "Admin").await;
    let group = group::ActiveModel {
        name: Set("Office Party".to_string()),
        budget_limit: Set(Some("$25".to_string())),
        exchange_date: Set(None),
        admin_user_id: Set(admin.id),
        status: Set(GroupStatus::Planning.as_str().to_string()),
        created_at: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let mut member_ids = Vec::with_capacity(size);
    if size > 0 {
        add_member(db, group.id, admin.id, 0).await;
        member_ids.push(admin.id);
    }
    for i in 1..size {
        let member = create_user(db, &format!("Member {}", i)).await;
        add_member(db, group.id, member.id, i as i64).await;
        member_ids.push(member.id);
    }

    GroupFixture { group, member_ids }
}

pub async fn reload_group(db: &DatabaseConnection, group_id: i64) -> group::Model {
    group::Entity::find_by_id(group_id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
}
