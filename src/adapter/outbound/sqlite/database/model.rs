//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{poolmember_properties, poolmembers};

/// Identity row of a pool member.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = poolmembers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PoolmemberRow {
    pub id: i32,
    pub device: String,
    pub partition: String,
    pub pool: String,
    pub nodename: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Identity row of a pool member (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = poolmembers)]
pub struct NewPoolmemberRow<'a> {
    pub device: &'a str,
    pub partition: &'a str,
    pub pool: &'a str,
    pub nodename: &'a str,
    pub created_at: String,
}

/// Mutable properties of a pool member.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = poolmember_properties)]
#[diesel(belongs_to(PoolmemberRow, foreign_key = poolmember_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PropertyRow {
    pub id: i32,
    pub poolmember_id: i32,
    pub port: i32,
    pub status: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Mutable properties of a pool member (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = poolmember_properties)]
pub struct NewPropertyRow {
    pub poolmember_id: i32,
    pub port: i32,
    pub status: bool,
    pub created_at: String,
}
